pub mod engine;

pub use engine::render_template;
