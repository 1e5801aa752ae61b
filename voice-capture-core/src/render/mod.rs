pub mod frame;
pub mod render_loop;
