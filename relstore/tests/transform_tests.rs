mod common;

use common::{
    ACCOUNT, ARTICLE, AUTHOR, CATEGORY, POST, PROFILE, asymmetric_edges, blog_module, blog_state,
    forum_module, state,
};
use pretty_assertions::assert_eq;
use relstore::{Attachable, Operation};
use serde_json::json;

// ── Expansion ────────────────────────────────────────────────────

#[test]
fn attach_without_displacement_is_unchanged() {
    let module = blog_module();
    let blog = state(
        &module,
        json!({
            "author": { "a1": { "articleIds": [] } },
            "article": { "r1": { "authorId": null } }
        }),
    );
    let attach = Operation::attach(ARTICLE, "r1", "authorId", "a1");

    assert_eq!(module.transformer().expand(&blog, attach.clone()), attach);
}

#[test]
fn reattaching_the_held_value_is_unchanged() {
    let module = blog_module();
    let blog = blog_state(&module);
    let attach = Operation::attach(ARTICLE, "r1", "authorId", "a1");

    assert_eq!(module.transformer().expand(&blog, attach.clone()), attach);
}

#[test]
fn one_overwrite_detaches_previous_target() {
    let module = blog_module();
    let mut blog = blog_state(&module);
    blog = module.reducer().reduce(&blog, &Operation::add(AUTHOR, "a2"));
    let attach = Operation::attach(ARTICLE, "r1", "authorId", "a2");

    let expanded = module.transformer().expand(&blog, attach.clone());

    assert_eq!(
        expanded,
        Operation::batch([Operation::detach(ARTICLE, "r1", "authorId", "a1"), attach])
    );
    let result = module.reducer().reduce(&blog, &expanded);
    let expected = state(
        &module,
        json!({
            "author": { "a1": { "articleIds": ["r2"] }, "a2": { "articleIds": ["r1"] } },
            "article": { "r1": { "authorId": "a2" }, "r2": { "authorId": "a1" } }
        }),
    );
    assert_eq!(result, expected);
}

#[test]
fn raw_overwrite_leaves_the_old_counterpart() {
    let module = blog_module();
    let blog = module
        .reducer()
        .reduce(&blog_state(&module), &Operation::add(AUTHOR, "a2"));

    let result = module
        .reducer()
        .reduce(&blog, &Operation::attach(ARTICLE, "r1", "authorId", "a2"));

    assert_eq!(
        asymmetric_edges(module.reader(), &result),
        ["author:a1.articleIds -> r1"]
    );
}

#[test]
fn attach_from_many_side_detaches_current_holder() {
    let module = blog_module();
    let blog = module
        .reducer()
        .reduce(&blog_state(&module), &Operation::add(AUTHOR, "a2"));
    let attach = Operation::attach(AUTHOR, "a2", "articleIds", "r1");

    let expanded = module.transformer().expand(&blog, attach.clone());

    assert_eq!(
        expanded,
        Operation::batch([Operation::detach(ARTICLE, "r1", "authorId", "a1"), attach])
    );
}

#[test]
fn one_to_one_detaches_both_previous_partners() {
    let module = forum_module();
    let forum = state(
        &module,
        json!({
            "account": { "a1": { "profileId": "p1" }, "a2": { "profileId": "p2" } },
            "profile": {
                "p1": { "accountId": "a1", "postIds": [] },
                "p2": { "accountId": "a2", "postIds": [] }
            }
        }),
    );
    let attach = Operation::attach(ACCOUNT, "a1", "profileId", "p2");

    let expanded = module.transformer().expand(&forum, attach.clone());

    assert_eq!(
        expanded,
        Operation::batch([
            Operation::detach(ACCOUNT, "a1", "profileId", "p1"),
            Operation::detach(PROFILE, "p2", "accountId", "a2"),
            attach,
        ])
    );
    let result = module.reducer().reduce(&forum, &expanded);
    let expected = state(
        &module,
        json!({
            "account": { "a1": { "profileId": "p2" }, "a2": { "profileId": null } },
            "profile": {
                "p1": { "accountId": null, "postIds": [] },
                "p2": { "accountId": "a1", "postIds": [] }
            }
        }),
    );
    assert_eq!(result, expected);
}

#[test]
fn add_detaches_holders_of_one_reciprocals() {
    let module = blog_module();
    let blog = blog_state(&module);
    let add = Operation::add_with(AUTHOR, "a2", vec![Attachable::new("articleIds", "r1")]);

    let expanded = module.transformer().expand(&blog, add.clone());

    assert_eq!(
        expanded,
        Operation::batch([Operation::detach(ARTICLE, "r1", "authorId", "a1"), add])
    );
    assert!(asymmetric_edges(module.reader(), &module.reducer().reduce(&blog, &expanded)).is_empty());
}

#[test]
fn add_of_existing_record_is_unchanged() {
    let module = blog_module();
    let blog = blog_state(&module);
    let add = Operation::add_with(AUTHOR, "a1", vec![Attachable::new("articleIds", "r1")]);

    assert_eq!(module.transformer().expand(&blog, add.clone()), add);
}

#[test]
fn batch_members_expand_against_evolving_state() {
    let module = blog_module();
    let blog = blog_state(&module);

    let expanded = module.transformer().expand(
        &blog,
        Operation::batch([
            Operation::add(AUTHOR, "a2"),
            Operation::attach(ARTICLE, "r1", "authorId", "a2"),
        ]),
    );

    assert_eq!(
        expanded,
        Operation::batch([
            Operation::add(AUTHOR, "a2"),
            Operation::batch([
                Operation::detach(ARTICLE, "r1", "authorId", "a1"),
                Operation::attach(ARTICLE, "r1", "authorId", "a2"),
            ]),
        ])
    );
}

#[test]
fn remove_and_detach_are_unchanged() {
    let module = blog_module();
    let blog = blog_state(&module);
    let remove = Operation::remove(AUTHOR, "a1");
    let detach = Operation::detach(ARTICLE, "r1", "authorId", "a1");

    assert_eq!(module.transformer().expand(&blog, remove.clone()), remove);
    assert_eq!(module.transformer().expand(&blog, detach.clone()), detach);
}

// ── Inverse ──────────────────────────────────────────────────────

#[test]
fn inverse_of_add_is_remove() {
    let module = blog_module();
    let blog = blog_state(&module);
    let add = Operation::add_with(ARTICLE, "r3", vec![Attachable::new("authorId", "a1")]);

    let inverse = module.transformer().inverse(&blog, &add).unwrap();

    assert_eq!(inverse, Operation::remove(ARTICLE, "r3"));
    let applied = module.reducer().reduce(&blog, &add);
    assert_eq!(module.reducer().reduce(&applied, &inverse), blog);
}

#[test]
fn inverse_of_attach_is_detach() {
    let module = blog_module();
    let blog = module
        .reducer()
        .reduce(&blog_state(&module), &Operation::add(ARTICLE, "r3"));
    let attach = Operation::attach_at(ARTICLE, "r3", "authorId", "a1", None, Some(0));

    let inverse = module.transformer().inverse(&blog, &attach).unwrap();

    assert_eq!(inverse, Operation::detach(ARTICLE, "r3", "authorId", "a1"));
}

#[test]
fn inverse_of_detach_restores_positions() {
    let module = forum_module();
    let forum = state(
        &module,
        json!({
            "post": {
                "o1": { "profileId": null, "categoryIds": ["c1"] },
                "o2": { "profileId": null, "categoryIds": ["c0", "c1", "c2"] },
                "o3": { "profileId": null, "categoryIds": ["c1"] }
            },
            "category": {
                "c0": { "postIds": ["o2"] },
                "c1": { "postIds": ["o1", "o2", "o3"] },
                "c2": { "postIds": ["o2"] }
            }
        }),
    );
    let detach = Operation::detach(POST, "o2", "categoryIds", "c1");

    let inverse = module.transformer().inverse(&forum, &detach).unwrap();

    assert_eq!(
        inverse,
        Operation::attach_at(POST, "o2", "categoryIds", "c1", Some(1), Some(1))
    );
}

#[test]
fn inverse_of_remove_recreates_links_in_place() {
    let module = forum_module();
    let forum = state(
        &module,
        json!({
            "profile": { "p1": { "accountId": null, "postIds": ["o1", "o2"] } },
            "post": {
                "o1": { "profileId": "p1", "categoryIds": ["c1"] },
                "o2": { "profileId": "p1", "categoryIds": ["c2", "c1"] }
            },
            "category": {
                "c1": { "postIds": ["o1", "o2"] },
                "c2": { "postIds": ["o2"] }
            }
        }),
    );
    let remove = Operation::remove(POST, "o2");

    let inverse = module.transformer().inverse(&forum, &remove).unwrap();

    let applied = module.reducer().reduce(&forum, &remove);
    assert_eq!(module.reducer().reduce(&applied, &inverse), forum);
    assert_eq!(
        inverse,
        Operation::batch([Operation::add_with(
            POST,
            "o2",
            vec![
                Attachable::new("categoryIds", "c2").at(0).reciprocal_at(0),
                Attachable::new("categoryIds", "c1").at(1).reciprocal_at(1),
                Attachable::new("profileId", "p1").reciprocal_at(1),
            ],
        )])
    );
}

#[test]
fn inverse_of_batch_runs_backwards() {
    let module = blog_module();
    let blog = blog_state(&module);
    let batch = Operation::batch([
        Operation::add(AUTHOR, "a2"),
        Operation::add_with(ARTICLE, "r3", vec![Attachable::new("authorId", "a2")]),
    ]);

    let inverse = module.transformer().inverse(&blog, &batch).unwrap();

    assert_eq!(
        inverse,
        Operation::batch([Operation::remove(ARTICLE, "r3"), Operation::remove(AUTHOR, "a2")])
    );
}

#[test]
fn noop_has_empty_inverse() {
    let module = blog_module();
    let blog = blog_state(&module);

    assert_eq!(
        module.transformer().inverse(&blog, &Operation::remove(AUTHOR, "ghost")),
        Some(Operation::batch([]))
    );
    assert_eq!(
        module
            .transformer()
            .inverse(&blog, &Operation::detach(AUTHOR, "a1", "articleIds", "r9")),
        Some(Operation::batch([]))
    );
}

#[test]
fn held_one_edge_and_missing_source_have_empty_inverses() {
    let module = forum_module();
    let forum = state(
        &module,
        json!({
            "profile": { "p1": { "accountId": null, "postIds": ["o1"] } },
            "post": { "o1": { "profileId": "p1", "categoryIds": [] } },
            "category": { "c1": { "postIds": ["o9"] } }
        }),
    );

    assert_eq!(
        module
            .transformer()
            .inverse(&forum, &Operation::attach(POST, "o1", "profileId", "p1")),
        Some(Operation::batch([]))
    );
    assert_eq!(
        module
            .transformer()
            .inverse(&forum, &Operation::detach(POST, "o9", "categoryIds", "c1")),
        Some(Operation::batch([]))
    );
}

#[test]
fn unexpanded_overwrite_has_no_exact_inverse() {
    let module = blog_module();
    let blog = module
        .reducer()
        .reduce(&blog_state(&module), &Operation::add(AUTHOR, "a2"));
    let attach = Operation::attach(ARTICLE, "r1", "authorId", "a2");

    assert_eq!(module.transformer().inverse(&blog, &attach), None);

    let expanded = module.transformer().expand(&blog, attach);
    let inverse = module.transformer().inverse(&blog, &expanded).unwrap();
    let applied = module.reducer().reduce(&blog, &expanded);
    assert_eq!(module.reducer().reduce(&applied, &inverse), blog);
}

#[test]
fn expansion_keeps_category_links_symmetric() {
    let module = forum_module();
    let forum = state(
        &module,
        json!({
            "post": { "o1": { "profileId": null, "categoryIds": [] } },
            "category": { "c1": { "postIds": [] } }
        }),
    );
    let attach = Operation::attach(CATEGORY, "c1", "postIds", "o1");

    let result = module
        .reducer()
        .reduce(&forum, &module.transformer().expand(&forum, attach));

    assert!(asymmetric_edges(module.reader(), &result).is_empty());
}
