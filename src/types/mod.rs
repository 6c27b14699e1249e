pub mod city;
pub mod data_source;
pub mod date_window;
