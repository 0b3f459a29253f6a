pub mod bar;
pub mod request_params;
pub mod time_series;
