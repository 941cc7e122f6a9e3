mod app;
mod camera;
mod controls;
mod dom;
mod frame_loop;
mod image;
mod listeners;
mod logging;
mod surface;

pub use app::run;
