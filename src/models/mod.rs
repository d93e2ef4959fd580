// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for the viewer.

pub mod annotation;
pub mod playback;
pub mod project;
pub mod remote;
pub mod sketch;
