//! Interactive viewer: the chart is rasterised once and shown until closed.

use crate::Result;
use crate::model::AggregatedTable;
use crate::render::chart::{TITLE, draw_chart};
use anyhow::anyhow;
use minifb::{Key, Window, WindowOptions};
use plotters::prelude::*;

pub const WINDOW_SIZE: (u32, u32) = (1024, 640);

/// Show the chart in a native window. Blocks until the window is closed
/// or Escape is pressed.
pub fn show(table: &AggregatedTable) -> Result<()> {
    let (width, height) = WINDOW_SIZE;
    let mut rgb = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        draw_chart(&root, table)?;
    }
    let frame = pack_rgb(&rgb);

    let (w, h) = (width as usize, height as usize);
    let mut window = Window::new(TITLE, w, h, WindowOptions::default())
        .map_err(|e| anyhow!("open chart window: {}", e))?;
    window.set_target_fps(30);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        window
            .update_with_buffer(&frame, w, h)
            .map_err(|e| anyhow!("update chart window: {}", e))?;
    }

    log::debug!("chart window closed");
    Ok(())
}

/// RGB8 triples to the 0RGB u32 pixels minifb expects.
fn pack_rgb(rgb: &[u8]) -> Vec<u32> {
    rgb.chunks_exact(3)
        .map(|p| (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2]))
        .collect()
}
