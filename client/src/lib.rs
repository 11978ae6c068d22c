mod app;
mod capture;
mod dom;
mod net;
mod sketch;
mod state;
mod surface;

pub use app::run;
