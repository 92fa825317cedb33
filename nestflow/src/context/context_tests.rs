//! Tests for the baseline/overlay context.

#[cfg(test)]
mod tests {
    use crate::context::{Context, Map};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn baseline() -> Context {
        Context::from_pairs([("a", json!(1)), ("b", json!("two"))])
    }

    #[test]
    fn test_get_absent_key() {
        let ctx = Context::new();
        assert!(ctx.get("missing").is_none());
        assert!(!ctx.contains_key("missing"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_set_writes_overlay_only() {
        let mut ctx = baseline();
        ctx.set("a", json!(10));
        ctx.set("c", json!(true));

        let (base, overlay) = ctx.decompose();
        assert_eq!(base.get("a"), Some(&json!(1)));
        assert!(base.get("c").is_none());
        assert_eq!(overlay.get("a"), Some(&json!(10)));
        assert_eq!(ctx.get("a"), Some(&json!(10)));
        assert_eq!(ctx.get("c"), Some(&json!(true)));
    }

    #[test]
    fn test_decompose_union_is_visible_state() {
        let mut ctx = baseline();
        ctx.set("b", json!("changed"));
        ctx.set("c", json!(3));

        let (base, overlay) = ctx.decompose();
        let mut union: Map = base.clone();
        for (k, v) in overlay {
            union.insert(k.clone(), v.clone());
        }

        assert_eq!(union, ctx.to_map());
        assert_eq!(ctx.keys(), vec!["a", "b", "c"]);
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn test_merge_overlay_into_fresh_baseline() {
        let mut inner = baseline();
        inner.set("a", json!(5));
        inner.set("z", json!(26));

        let mut target = Context::from_pairs([("a", json!(0)), ("keep", json!("me"))]);
        inner.merge_overlay_into(&mut target);

        // Overlay keys win, untouched keys keep the target's values.
        assert_eq!(target.get("a"), Some(&json!(5)));
        assert_eq!(target.get("z"), Some(&json!(26)));
        assert_eq!(target.get("keep"), Some(&json!("me")));
        // Inner baseline entries are not copied.
        assert!(target.get("b").is_none());

        // Merging again changes nothing.
        let before = target.to_map();
        inner.merge_overlay_into(&mut target);
        assert_eq!(target.to_map(), before);
    }

    #[test]
    fn test_wrap_creates_new_identity() {
        let mut outer = baseline();
        outer.set("c", json!(3));

        let inner = outer.wrap();
        assert!(!inner.is_same(&outer));
        assert_eq!(inner.to_map(), outer.to_map());

        let (base, overlay) = inner.decompose();
        assert_eq!(base.len(), 3);
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_move_keeps_identity() {
        let ctx = baseline();
        let id = ctx.id();
        let moved = ctx;
        assert_eq!(moved.id(), id);
    }

    #[test]
    fn test_same_values_different_identity() {
        let left = baseline();
        let right = baseline();
        assert_eq!(left.to_map(), right.to_map());
        assert!(!left.is_same(&right));
    }

    #[test]
    fn test_fork_is_a_distinct_context() {
        let mut original = baseline();
        original.set("c", json!(3));

        let mut forked = original.fork();
        assert!(!forked.is_same(&original));
        assert_eq!(forked.to_map(), original.to_map());
        assert_eq!(forked.decompose().1.len(), 1);

        forked.set("a", json!(99));
        assert_eq!(original.get("a"), Some(&json!(1)));
        assert_eq!(forked.get("a"), Some(&json!(99)));
    }

    #[test]
    fn test_serialize_flattened() {
        let mut ctx = baseline();
        ctx.set("a", json!(2));

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json, json!({"a": 2, "b": "two"}));
        assert_eq!(ctx.to_json(), json);
    }
}
