//! Viewport and annotation engine for the microscopy slide viewer.
//!
//! This crate compiles to WebAssembly for the browser and to native code for
//! headless use. It owns the interactive core of the viewer: mapping pointer
//! gestures to a zoom/pan viewport, drawing the slide raster under that
//! viewport, and letting the user place point, rectangle and circle markers on
//! top of it. The host layer only selects the active slide, forwards DOM
//! events, runs the image loader future, and consumes the finalized
//! [`annotation::Annotation`]s reported through [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`annotation`] | Annotation records, the in-progress draft, and the append-only store |
//! | [`viewport`] | Zoom/pan state and the image placement rule |
//! | [`input`] | Tools and the gesture state machine |
//! | [`loader`] | Slide registry client, raster decoding, and load tickets |
//! | [`render`] | Render pipeline over the [`render::Surface`] trait |
//! | [`display_list`] | Recording surface for headless rendering |
//! | [`web`] | `CanvasRenderingContext2d` surface |
//! | [`config`] | Environment-driven configuration |
//! | [`consts`] | Shared numeric and style constants |

pub mod annotation;
pub mod config;
pub mod consts;
pub mod display_list;
pub mod engine;
pub mod input;
pub mod loader;
pub mod render;
pub mod viewport;
pub mod web;
