// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame-synchronized playback: time-to-frame conversion, annotation
//! lookup, the playback state machine and timeline navigation.

pub mod clock;
pub mod controller;
pub mod source;
pub mod store;
pub mod timeline;
