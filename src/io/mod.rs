// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: media backends, annotation files, the remote API and
//! the local video server.

pub mod api;
pub mod media;
pub mod serialization;
pub mod server;
