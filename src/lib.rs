//! swipekey – swipe and tap keyboard gesture engine for touch surfaces.
//!
//! Raw pointer samples go through [`normalize`], [`layout`] and
//! [`recognizer`]; the [`engine::KeyboardEngine`] forwards the resulting
//! text to a [`sink::TextSink`] and feeds [`render::Renderer`] once per tick.

pub mod config;
pub mod engine;
pub mod event;
pub mod layout;
pub mod manager;
pub mod normalize;
pub mod recognizer;
pub mod render;
pub mod sink;
pub mod text;
