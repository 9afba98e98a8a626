use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("font could not be loaded: {0}")]
    Font(String),
}
