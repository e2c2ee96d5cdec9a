//! Write/read any serde-capable record to/from 
//! toml or json files.
//!
//! The descriptions and the device settings are 
//! both stored this way.

use std::fs::File;
use std::io::{
  Write,
  Read,
};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::SerializationError;

/// Append the extension if the filename does not have it yet
fn with_extension(filename : &str, ext : &str) -> String {
  let mut fname = String::from(filename);
  if !fname.ends_with(ext) {
    fname += ext;
  }
  fname
}

fn read_to_string(filename : &str) -> Result<String, SerializationError> {
  match File::open(filename) {
    Err(err) => {
      error!("Unable to open {}! {}", filename, err);
      Err(SerializationError::FileNotFound)
    }
    Ok(mut file) => {
      let mut content = String::from("");
      match file.read_to_string(&mut content) {
        Err(err) => {
          error!("Unable to read {}! {}", filename, err);
          Err(SerializationError::FileNotFound)
        }
        Ok(_) => Ok(content)
      }
    }
  }
}

fn write_string(filename : &str, content : &str) -> Result<(), SerializationError> {
  info!("Will write to file {}!", filename);
  match File::create(filename) {
    Err(err) => {
      error!("Unable to open file {}! {}", filename, err);
      Err(SerializationError::FileNotWritable)
    }
    Ok(mut file) => {
      match file.write_all(content.as_bytes()) {
        Err(err) => {
          error!("Unable to write to file {}! {}", filename, err);
          Err(SerializationError::FileNotWritable)
        }
        Ok(_) => {
          debug!("Wrote {} bytes to {}!", content.len(), filename);
          Ok(())
        }
      }
    }
  }
}

/// Write a record as toml. The ".toml" extension 
/// gets added if missing.
///
/// Returns the name of the file which was written
pub fn to_toml_file<T : Serialize>(record   : &T,
                                   filename : &str)
  -> Result<String, SerializationError> {
  let fname = with_extension(filename, ".toml");
  match toml::to_string(record) {
    Err(err) => {
      error!("Unable to serialize toml! {err}");
      Err(SerializationError::TomlEncodingError)
    }
    Ok(toml_string) => {
      write_string(&fname, &toml_string)?;
      Ok(fname)
    }
  }
}

/// Read a record from a toml file
pub fn from_toml_file<T : DeserializeOwned>(filename : &str)
  -> Result<T, SerializationError> {
  let toml_string = read_to_string(filename)?;
  match toml::from_str(&toml_string) {
    Err(err) => {
      error!("Can't interpret toml! {}", err);
      Err(SerializationError::TomlDecodingError)
    }
    Ok(record) => Ok(record)
  }
}

/// Write a record as (pretty) json. The ".json" extension
/// gets added if missing.
pub fn to_json_file<T : Serialize>(record   : &T,
                                   filename : &str)
  -> Result<String, SerializationError> {
  let fname = with_extension(filename, ".json");
  match serde_json::to_string_pretty(record) {
    Err(err) => {
      error!("Unable to serialize json! {err}");
      Err(SerializationError::JsonEncodingError)
    }
    Ok(json_string) => {
      write_string(&fname, &json_string)?;
      Ok(fname)
    }
  }
}

/// Read a record from a json file
pub fn from_json_file<T : DeserializeOwned>(filename : &str)
  -> Result<T, SerializationError> {
  let json_string = read_to_string(filename)?;
  match serde_json::from_str(&json_string) {
    Err(err) => {
      error!("Can't interpret json! {}", err);
      Err(SerializationError::JsonDecodingError)
    }
    Ok(record) => Ok(record)
  }
}

/// Render a record as toml for `Display` implementations
pub fn toml_repr<T : Serialize>(record : &T) -> String {
  match toml::to_string(record) {
    Err(err) => {
      error!("Serialization error! {err}");
      String::from("-- SERIALIZATION ERROR! --")
    }
    Ok(repr) => repr
  }
}

#[test]
fn missing_file_is_reported() {
  let result = from_toml_file::<u32>("this-file-does-not-exist.toml");
  assert_eq!(result, Err(SerializationError::FileNotFound));
}

#[test]
fn extension_gets_added() {
  assert_eq!(with_extension("ttcrx", ".toml"), "ttcrx.toml");
  assert_eq!(with_extension("ttcrx.toml", ".toml"), "ttcrx.toml");
}
