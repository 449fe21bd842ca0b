// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: image intake, background sources, bulk text rewriting
//! and saving exports.

pub mod media;
pub mod replace;
pub mod save;
pub mod sources;
