//! Error type shared by every stage of the LOD & impostor pipeline.

/// Errors raised by generation, allocation, buffering and atlas baking.
///
/// All variants are raised synchronously where they are detected and are
/// never retried internally. `LostInstances` and `CapacityExceeded` indicate
/// a correctness bug in the pipeline and should abort the frame loop.
#[derive(thiserror::Error, Debug)]
pub enum ImpostorError {
  /// Malformed generation or configuration input.
  #[error("invalid parameter: {0}")]
  InvalidParameter(String),

  /// Bucket sizes no longer sum to the instance count after reallocation.
  #[error("lost instances during reallocation: buckets hold {allocated} of {expected}")]
  LostInstances { expected: usize, allocated: usize },

  /// A tier bucket is larger than its transform buffer capacity.
  #[error("tier {tier} needs {requested} instances but buffer holds {capacity}")]
  CapacityExceeded {
    tier: usize,
    requested: usize,
    capacity: usize,
  },

  /// The atlas render target cannot provide the requested attachment size.
  #[error("render target supports at most {max}px, atlas needs {requested}px")]
  UnsupportedProfile { requested: u32, max: u32 },

  /// Configuration file could not be parsed.
  #[error("config parse error: {0}")]
  Config(#[from] toml::de::Error),

  /// Configuration or atlas file could not be read or written.
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  /// Atlas image could not be encoded or decoded.
  #[error("image error: {0}")]
  Image(#[from] image::ImageError),
}

impl ImpostorError {
  pub fn invalid<T: ToString>(msg: T) -> Self {
    ImpostorError::InvalidParameter(msg.to_string())
  }
}

/// Result type alias for pipeline operations.
pub type ImpostorResult<T> = Result<T, ImpostorError>;
