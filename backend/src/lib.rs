pub mod types;
pub mod logger;
pub mod config;
pub mod book_sort;
pub mod item_filter;
pub mod lexicon;
pub mod alignment;
pub mod interleave;
pub mod validation;
pub mod corpus;
pub mod item_source;
pub mod artifact;
pub mod generator;
pub mod supervisor;
pub mod populate;
pub mod source_corpus;
pub mod pipeline;

pub mod db;

use std::env;
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::error::Error;
use app_dirs::{get_app_root, AppDataType, AppInfo};

pub const APP_INFO: AppInfo = AppInfo{name: "interlinear", author: "interlinear"};

pub fn get_create_interlinear_app_root() -> Result<PathBuf, Box<dyn Error>> {
    let p = get_app_root(AppDataType::UserData, &APP_INFO)?;
    if !p.exists() {
        create_dir_all(&p)?;
    }
    Ok(p)
}

/// The working data directory: `INTERLINEAR_DIR` if set, else the user app root.
pub fn get_create_interlinear_dir() -> Result<PathBuf, Box<dyn Error>> {
    let p = match env::var("INTERLINEAR_DIR") {
        Ok(s) if !s.is_empty() => PathBuf::from(s),
        _ => get_create_interlinear_app_root()?,
    };
    if !p.exists() {
        create_dir_all(&p)?;
    }
    Ok(p)
}
