// Defaults shared by the core and the web frontend.

// Surface
pub const DEFAULT_MAX_DEVICE_PIXEL_RATIO: f64 = 2.0; // caps backing store growth on dense displays
pub const MIN_BACKING_PX: u32 = 1; // a zero-sized backing store is never allocated
pub const DEFAULT_BACKGROUND_HEX: &str = "#000000";

// Input reactors
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 100; // coalescing window for resize observer bursts
pub const DEFAULT_POINTER_UV: [f32; 2] = [0.5, 0.5]; // centre until the first pointer move

// Parameter names understood by every effect
pub const POINTER_PARAM: &str = "pointer";
pub const COLOR_PARAM: &str = "color";
pub const SPEED_PARAM: &str = "speed";

// Pixel blast defaults
pub const PIXEL_BLAST_PIXEL_SIZE: f32 = 3.0;
pub const PIXEL_BLAST_COLOR_HEX: &str = "#B19EEF";
pub const PIXEL_BLAST_PATTERN_SCALE: f32 = 2.0;
pub const PIXEL_BLAST_PATTERN_DENSITY: f32 = 1.0;
pub const PIXEL_BLAST_SPEED: f32 = 0.5;
pub const PIXEL_BLAST_EDGE_FADE: f32 = 0.25;
pub const PIXEL_BLAST_RIPPLE_INTENSITY: f32 = 1.0;

// Grid field defaults
pub const GRID_CELL_SIZE_PX: f32 = 40.0;
pub const GRID_LINE_WIDTH_PX: f32 = 1.0;
pub const GRID_COLOR_HEX: &str = "#2A2A3A";
pub const GRID_SPEED: f32 = 0.5; // cells per second
pub const GRID_DIRECTION: [f32; 2] = [1.0, 1.0];
pub const GRID_HOVER_RADIUS_PX: f32 = 120.0;

// Uniform clamp limits (applied by consumers, never by the store)
pub const PIXEL_SIZE_MIN: f32 = 1.0;
pub const PIXEL_SIZE_MAX: f32 = 64.0;
pub const PATTERN_DENSITY_MAX: f32 = 2.0;
pub const SPEED_MAX: f32 = 10.0;
