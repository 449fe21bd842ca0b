// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Render surface and its SVG serialization.

pub mod stage;
pub mod svg;
