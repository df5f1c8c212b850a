mod dial;

pub use dial::render_dial;
