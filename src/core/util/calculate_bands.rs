use std::num::NonZeroU32;
use std::ops::Range;

/// Number of row bands to cut an image of `height` rows into.
///
/// Never more bands than rows, so every band owns at least one row.
pub fn calculate_bands(max_bands: NonZeroU32, height: u32) -> u32 {
    if height == 0 {
        0
    } else if max_bands.get() > height {
        height
    } else {
        max_bands.get()
    }
}

/// Row ranges for `bands` bands over `height` rows.
///
/// Every band gets `height / bands` rows, the last band also takes the
/// remainder rows.
pub fn band_row_ranges(height: u32, bands: u32) -> Vec<Range<u32>> {
    let Some(max_bands) = NonZeroU32::new(bands) else {
        return Vec::new();
    };

    let total_bands = calculate_bands(max_bands, height);

    if total_bands == 0 {
        return Vec::new();
    }

    let band_height = height / total_bands;

    (0..total_bands)
        .map(|band_num| {
            let band_top = band_num * band_height;
            let band_end = if band_num == total_bands - 1 {
                height
            } else {
                (band_num + 1) * band_height
            };

            band_top..band_end
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_gives_one_band() {
        assert_eq!(calculate_bands(NonZeroU32::new(10).unwrap(), 1), 1);
    }

    #[test]
    fn test_bands_do_not_exceed_height() {
        assert_eq!(calculate_bands(NonZeroU32::new(10).unwrap(), 6), 6);
        assert_eq!(calculate_bands(NonZeroU32::new(3).unwrap(), 6), 3);
    }

    #[test]
    fn test_zero_height_gives_no_bands() {
        assert_eq!(calculate_bands(NonZeroU32::new(4).unwrap(), 0), 0);
        assert!(band_row_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_zero_bands_gives_no_ranges() {
        assert!(band_row_ranges(10, 0).is_empty());
    }

    #[test]
    fn test_even_split() {
        assert_eq!(band_row_ranges(480, 4), vec![0..120, 120..240, 240..360, 360..480]);
    }

    #[test]
    fn test_last_band_takes_remainder_rows() {
        assert_eq!(band_row_ranges(10, 4), vec![0..2, 2..4, 4..6, 6..10]);
    }

    #[test]
    fn test_ranges_are_contiguous_and_cover_height() {
        for height in 1..40 {
            for bands in 1..12 {
                let ranges = band_row_ranges(height, bands);

                assert_eq!(ranges.first().unwrap().start, 0);
                assert_eq!(ranges.last().unwrap().end, height);
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                    assert!(pair[0].start < pair[0].end);
                }
            }
        }
    }
}
