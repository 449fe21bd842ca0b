// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the LabelPad application.

pub mod canvas;
pub mod interaction;
pub mod side_panel;
pub mod toolbar;
