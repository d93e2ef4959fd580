// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay drawing and frame capture.

pub mod capture;
pub mod overlay;
pub mod raster;
