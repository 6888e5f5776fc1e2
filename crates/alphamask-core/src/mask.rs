//! Channel masking for captured grids.

use crate::config::ChannelMode;
use crate::grid::PixelGrid;

/// Zero the two channels `mode` does not select. `All` is a no-op.
///
/// The kept channel is ANDed with `0xFFFF`, so its value is untouched.
pub fn apply_channel_mask(grid: &mut PixelGrid, mode: ChannelMode) {
    let Some(keep) = mode.keep_mask() else {
        return;
    };
    for px in grid.pixels_mut() {
        px[0] &= keep[0];
        px[1] &= keep[1];
        px[2] &= keep[2];
    }
}

/// The signal channel for `mode` as a single-channel plane.
pub fn extract_channel(grid: &PixelGrid, mode: ChannelMode) -> Vec<u16> {
    grid.channel(mode.signal_channel())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_grid() -> PixelGrid {
        let mut grid = PixelGrid::new(8);
        for y in 0..8 {
            for x in 0..8 {
                let v = (y * 8 + x) as u16;
                grid.set(x, y, [v * 1000, v * 700 + 3, u16::MAX - v]);
            }
        }
        grid
    }

    #[test]
    fn test_single_channel_modes_zero_the_others() {
        let source = make_test_grid();
        for (mode, kept) in [
            (ChannelMode::Red, 0),
            (ChannelMode::Green, 1),
            (ChannelMode::Blue, 2),
        ] {
            let mut grid = source.clone();
            apply_channel_mask(&mut grid, mode);
            for (before, after) in source.pixels().iter().zip(grid.pixels()) {
                for c in 0..3 {
                    if c == kept {
                        assert_eq!(after[c], before[c], "{mode:?} changed kept channel");
                    } else {
                        assert_eq!(after[c], 0, "{mode:?} left channel {c} set");
                    }
                }
            }
        }
    }

    #[test]
    fn test_all_mode_is_identity() {
        let source = make_test_grid();
        let mut grid = source.clone();
        apply_channel_mask(&mut grid, ChannelMode::All);
        assert_eq!(grid, source);
    }

    #[test]
    fn test_extract_channel_reads_signal() {
        let grid = make_test_grid();
        assert_eq!(extract_channel(&grid, ChannelMode::Green), grid.channel(1));
        assert_eq!(extract_channel(&grid, ChannelMode::All), grid.channel(0));
    }
}
