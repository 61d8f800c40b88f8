//! View state and coordinate engine for an interactive planet map viewer.
//!
//! The engine keeps terrain, region polygons and point markers consistent
//! inside a pannable, zoomable viewport, and serializes the whole view into a
//! share link that restores it exactly. Drawing, clipboard access, storage and
//! geography transport are traits the host implements; the `planetmap` binary
//! wires the filesystem implementations into a small HTTP service.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | The [`engine::Viewer`] controller, commands and load requests |
//! | [`camera`] | Pan/zoom transform and its clamping store |
//! | [`coords`] | World, normalized, local and screen conversions |
//! | [`icons`] | Marker wire format and screen placement |
//! | [`selection`] | Region category filter |
//! | [`geo`] | Planet geography and TopoJSON decoding |
//! | [`source`] | Async geography sources (HTTP, filesystem) |
//! | [`persist`] | Share-link codec and restore precedence |
//! | [`storage`] | Local key/value persistence |
//! | [`render`] | Renderer and clipboard capabilities |
//! | [`consts`] | World extent, zoom limits and defaults |
//! | [`config`], [`state`], [`routes`] | The HTTP service |

pub mod camera;
pub mod config;
pub mod consts;
pub mod coords;
pub mod engine;
pub mod geo;
pub mod icons;
pub mod persist;
pub mod render;
pub mod routes;
pub mod selection;
pub mod source;
pub mod state;
pub mod storage;
