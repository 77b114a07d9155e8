//! Hit-test properties of [`Rect`], the region a mounted lookup registers
//! for outside-press dismissal.

use lookup_core::geometry::Rect;
use proptest::prelude::*;

fn on_screen() -> impl Strategy<Value = Rect> {
    (0u16..=300, 0u16..=120, 0u16..=200, 0u16..=40)
        .prop_map(|(x, y, width, height)| Rect::new(x, y, width, height))
}

fn anywhere() -> impl Strategy<Value = Rect> {
    any::<(u16, u16, u16, u16)>().prop_map(|(x, y, width, height)| Rect::new(x, y, width, height))
}

proptest! {
    /// A press inside the input or the panel is never treated as outside
    /// the merged bounds.
    #[test]
    fn merged_bounds_cover_both_parts(
        input in on_screen(),
        panel in on_screen(),
        px in 0u16..=600,
        py in 0u16..=200,
    ) {
        let bounds = input.union(&panel);
        if input.contains(px, py) || panel.contains(px, py) {
            prop_assert!(bounds.contains(px, py), "bounds={bounds:?} p=({px},{py})");
        }
    }

    #[test]
    fn merge_order_does_not_matter(a in on_screen(), b in on_screen()) {
        prop_assume!(!a.is_empty() && !b.is_empty());
        prop_assert_eq!(a.union(&b), b.union(&a));
    }

    #[test]
    fn empty_regions_are_never_hit(r in anywhere(), px in any::<u16>(), py in any::<u16>()) {
        if r.is_empty() {
            prop_assert!(!r.contains(px, py));
        }
    }

    #[test]
    fn extreme_coordinates_saturate(r in anywhere(), px in any::<u16>(), py in any::<u16>()) {
        let _ = r.contains(px, py);
        prop_assert_eq!(r.union(&r), if r.is_empty() { r } else { Rect::new(r.x, r.y, r.right() - r.x, r.bottom() - r.y) });
        prop_assert!(r.right() >= r.x);
        prop_assert!(r.bottom() >= r.y);
    }
}
