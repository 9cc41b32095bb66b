use super::test_helpers::{
    ScriptedEngine, ScriptedOutcome, create_test_downloader, test_config, wait_for_status,
    wait_for_terminal,
};
use super::*;
use crate::engine::EngineEvent;
use crate::types::{MediaFormat, TaskStatus};
