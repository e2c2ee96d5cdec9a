use std::error::Error;
use std::fmt;

/// Problems when writing/reading descriptions
/// and settings to/from disk
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SerializationError {
  FileNotFound,
  FileNotWritable,
  TomlDecodingError,
  TomlEncodingError,
  JsonDecodingError,
  JsonEncodingError,
}

impl SerializationError {
  pub fn to_string(&self) -> String {
    match self {
      SerializationError::FileNotFound      => {return String::from("FileNotFound");},
      SerializationError::FileNotWritable   => {return String::from("FileNotWritable");},
      SerializationError::TomlDecodingError => {return String::from("TomlDecodingError");},
      SerializationError::TomlEncodingError => {return String::from("TomlEncodingError");},
      SerializationError::JsonDecodingError => {return String::from("JsonDecodingError");},
      SerializationError::JsonEncodingError => {return String::from("JsonEncodingError");},
    }
  }
}

impl fmt::Display for SerializationError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let repr = self.to_string();
    write!(f, "<SerializationError : {}>", repr)
  }
}

impl Error for SerializationError {
}
