//! Database integration tests.

use super::*;
use crate::error::AppError;
use crate::models::command::{CommandKind, CommandState};
use crate::models::mapping::{EmojiMapping, MappingScope};
use crate::test_support::setup_temp_db;
use serde_json::json;
