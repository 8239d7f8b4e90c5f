//! Property-based tests for mosaic planning.
//!
//! Random tile layouts (adjoining, overlapping, or with gaps) are planned and
//! the extent, resolution and placement invariants are checked on each.

#[cfg(test)]
mod proptest_tests {
    use crate::metadata::{Bounds, TileMetadata};
    use crate::plan::{union_bounds, Mode, MosaicPlan, SourcePathStyle, Tile};
    use crate::resolution::Resolution;
    use proptest::prelude::*;

    /// A tile at `(col, row)` on a 10-unit lattice, `w` by `h` pixels at `res`.
    fn tile_strategy() -> impl Strategy<Value = Tile> {
        (-20i32..20, -20i32..20, 1u32..50, 1u32..50, prop::sample::select(vec![0.5, 1.0, 2.0, 5.0]))
            .prop_map(|(col, row, w, h, res)| {
                let left = f64::from(col) * 10.0;
                let top = f64::from(row) * 10.0;
                let bounds = Bounds::new(
                    left,
                    top - f64::from(h) * res,
                    left + f64::from(w) * res,
                    top,
                );
                Tile::new(
                    format!("/tiles/{col}_{row}.tif"),
                    TileMetadata::new("EPSG:3857", bounds, w, h),
                )
            })
    }

    fn tiles_strategy() -> impl Strategy<Value = Vec<Tile>> {
        prop::collection::vec(tile_strategy(), 1..12)
    }

    fn resolutions(tiles: &[Tile]) -> Vec<(f64, f64)> {
        tiles.iter().map(|t| t.metadata.resolution).collect()
    }

    proptest! {
        /// Property: the extent contains every tile, the first one included
        #[test]
        fn extent_contains_every_tile(tiles in tiles_strategy()) {
            let extent = union_bounds(&tiles).unwrap();
            for tile in &tiles {
                prop_assert!(extent.contains(&tile.metadata.bounds));
            }
        }

        /// Property: the extent is tight, each edge comes from some tile
        #[test]
        fn extent_is_tight(tiles in tiles_strategy()) {
            let extent = union_bounds(&tiles).unwrap();
            prop_assert!(tiles.iter().any(|t| t.metadata.bounds.left == extent.left));
            prop_assert!(tiles.iter().any(|t| t.metadata.bounds.right == extent.right));
            prop_assert!(tiles.iter().any(|t| t.metadata.bounds.top == extent.top));
            prop_assert!(tiles.iter().any(|t| t.metadata.bounds.bottom == extent.bottom));
        }

        /// Property: highest is no coarser and lowest no finer than any tile
        #[test]
        fn highest_and_lowest_bound_every_tile(tiles in tiles_strategy()) {
            let (hx, hy) = Resolution::Highest.reconcile(&resolutions(&tiles)).unwrap();
            let (lx, ly) = Resolution::Lowest.reconcile(&resolutions(&tiles)).unwrap();
            for (x, y) in resolutions(&tiles) {
                prop_assert!(hx <= x && hy <= y);
                prop_assert!(lx >= x && ly >= y);
            }
        }

        /// Property: average lies between highest and lowest
        #[test]
        fn average_is_between_extremes(tiles in tiles_strategy()) {
            let res = resolutions(&tiles);
            let (ax, ay) = Resolution::Average.reconcile(&res).unwrap();
            let (hx, hy) = Resolution::Highest.reconcile(&res).unwrap();
            let (lx, ly) = Resolution::Lowest.reconcile(&res).unwrap();
            prop_assert!(hx <= ax + 1e-9 && ax <= lx + 1e-9);
            prop_assert!(hy <= ay + 1e-9 && ay <= ly + 1e-9);
        }

        /// Property: one source per tile per band, in input order
        #[test]
        fn mosaic_keeps_input_order(tiles in tiles_strategy()) {
            let plan = MosaicPlan::build(&tiles, Mode::Mosaic, Resolution::Average, &SourcePathStyle::Absolute)
                .unwrap();
            prop_assert_eq!(plan.bands.len(), 1);
            let paths: Vec<String> = plan.bands[0].sources.iter().map(|s| s.path.clone()).collect();
            let expected: Vec<String> = tiles.iter().map(|t| t.path.display().to_string()).collect();
            prop_assert_eq!(paths, expected);
        }

        /// Property: at unit resolution on integral bounds, offsets are exact
        #[test]
        fn unit_resolution_offsets_are_exact(tiles in tiles_strategy()) {
            let plan = MosaicPlan::build(
                &tiles,
                Mode::Mosaic,
                Resolution::Explicit { x: 1.0, y: 1.0 },
                &SourcePathStyle::Absolute,
            )
            .unwrap();
            for (tile, source) in tiles.iter().zip(&plan.bands[0].sources) {
                let bounds = tile.metadata.bounds;
                prop_assert_eq!(source.dst.x_off as f64, bounds.left - plan.bounds.left);
                prop_assert_eq!(source.dst.y_off as f64, plan.bounds.top - bounds.top);
            }
        }

        /// Property: stack mode yields one masked band per tile
        #[test]
        fn stack_has_one_band_per_tile(tiles in tiles_strategy()) {
            let plan = MosaicPlan::build(&tiles, Mode::Stack, Resolution::Average, &SourcePathStyle::Absolute)
                .unwrap();
            prop_assert_eq!(plan.bands.len(), tiles.len());
            for (i, band) in plan.bands.iter().enumerate() {
                prop_assert_eq!(band.index, i + 1);
                prop_assert_eq!(band.sources.len(), 1);
                prop_assert!(band.sources[0].use_mask_band);
            }
        }
    }
}
