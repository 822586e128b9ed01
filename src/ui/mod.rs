pub mod arena_renderer;
