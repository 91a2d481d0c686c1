//! Integration tests for gilt-style.
//!
//! These tests exercise the public API from outside the crate: loading and
//! combining style sheets, resolving element definitions against a document,
//! and the decorator, keyframe and sprite tables behind them.

use std::sync::Arc;

use gilt_style::css::color::Color;
use gilt_style::css::properties::{PropertyId, PropertyValue, SourceLocation};
use gilt_style::dom::{Document, ElementData, ElementId};
use gilt_style::style::decorator::{DecoratorKind, ImageSource};
use gilt_style::style::keyframes::Iterations;
use gilt_style::{ElementDefinition, LoadError, StyleSheet};
use pretty_assertions::assert_eq;

fn sheet(css: &str) -> StyleSheet {
    let mut sheet = StyleSheet::new();
    sheet.load_style_sheet(css, "test.css").unwrap();
    sheet.build_node_index_and_optimize_properties();
    sheet
}

fn unbuilt(css: &str, name: &str) -> StyleSheet {
    let mut sheet = StyleSheet::new();
    sheet.load_style_sheet(css, name).unwrap();
    sheet
}

fn definition(sheet: &StyleSheet, doc: &Document, id: ElementId) -> Arc<ElementDefinition> {
    sheet.get_element_definition(&doc.element(id).unwrap())
}

fn color(definition: &ElementDefinition) -> Option<Color> {
    match definition.value(PropertyId::Color)? {
        PropertyValue::Color(c) => Some(*c),
        _ => None,
    }
}

const RED: Color = Color::rgb(255, 0, 0);
const GREEN: Color = Color::rgb(0, 128, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

// ---------------------------------------------------------------------------
// Index build and determinism
// ---------------------------------------------------------------------------

#[test]
fn test_index_build_is_idempotent() {
    let mut sheet = unbuilt(
        "div p { color: red; decorator: gradient(vertical #fff #000); } .note { opacity: 0.5; }",
        "a.css",
    );
    sheet.build_node_index_and_optimize_properties();

    let mut doc = Document::new();
    let div = doc.insert(ElementData::new("div"));
    let p = doc.insert_child(div, ElementData::new("p").with_class("note"));

    let first = definition(&sheet, &doc, p);
    let counts = (sheet.rule_node_count(), sheet.styled_index().len(), sheet.complete_index().len());

    sheet.build_node_index_and_optimize_properties();
    let second = definition(&sheet, &doc, p);

    assert_eq!(
        (sheet.rule_node_count(), sheet.styled_index().len(), sheet.complete_index().len()),
        counts
    );
    // Already-resolved values keep their instances.
    assert_eq!(*first, *second);
    assert_eq!(first.decorators().len(), 1);
}

#[test]
fn test_definitions_are_deterministic() {
    let css = "ul li { color: red; } li.active { color: blue; opacity: 0.5; } li { margin: 1px 2px; }";
    let a = sheet(css);
    let b = sheet(css);

    let mut doc = Document::new();
    let ul = doc.insert(ElementData::new("ul"));
    let li = doc.insert_child(ul, ElementData::new("li").with_class("active"));

    assert_eq!(
        definition(&a, &doc, li).to_string(),
        definition(&b, &doc, li).to_string()
    );
}

#[test]
fn test_definition_snapshot() {
    let sheet = sheet(
        "button { color: red; opacity: 0.5; padding: 2px 4px; }
         button.primary { color: blue; font-weight: bold; }",
    );
    let mut doc = Document::new();
    let button = doc.insert(ElementData::new("button").with_class("primary"));

    let definition = definition(&sheet, &doc, button);
    insta::assert_snapshot!(definition.to_string().trim_end(), @r"
    padding-top: 2px;
    padding-right: 4px;
    padding-bottom: 2px;
    padding-left: 4px;
    color: #0000ff;
    opacity: 0.5;
    font-weight: bold;
    ");
}

// ---------------------------------------------------------------------------
// Definition cache
// ---------------------------------------------------------------------------

#[test]
fn test_siblings_share_definition() {
    let sheet = sheet("li { color: red; } li.odd { color: blue; }");
    let mut doc = Document::new();
    let ul = doc.insert(ElementData::new("ul"));
    let a = doc.insert_child(ul, ElementData::new("li").with_class("odd"));
    let b = doc.insert_child(ul, ElementData::new("li"));
    let c = doc.insert_child(ul, ElementData::new("li").with_class("odd"));

    let first = definition(&sheet, &doc, a);
    let second = definition(&sheet, &doc, b);
    let third = definition(&sheet, &doc, c);

    assert!(Arc::ptr_eq(&first, &third));
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(color(&first), Some(BLUE));
    assert_eq!(color(&second), Some(RED));
}

#[test]
fn test_empty_match_is_empty_definition() {
    let sheet = sheet("p { color: red; }");
    let mut doc = Document::new();
    let div = doc.insert(ElementData::new("div"));
    let span = doc.insert(ElementData::new("span"));

    let a = definition(&sheet, &doc, div);
    let b = definition(&sheet, &doc, span);
    assert!(a.is_empty());
    assert!(Arc::ptr_eq(&a, &b));
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

#[test]
fn test_id_beats_class() {
    let sheet = sheet("#x { color: red; } .y { color: blue; } p { color: green; }");
    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p").with_id("x").with_class("y"));
    assert_eq!(color(&definition(&sheet, &doc, p)), Some(RED));
}

#[test]
fn test_later_declaration_wins() {
    let sheet = sheet("p { color: red; } p { color: blue; } span { color: red; color: green; }");
    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p"));
    let span = doc.insert(ElementData::new("span"));
    assert_eq!(color(&definition(&sheet, &doc, p)), Some(BLUE));
    assert_eq!(color(&definition(&sheet, &doc, span)), Some(GREEN));
}

#[test]
fn test_important_beats_specificity() {
    let sheet = sheet("p { color: red !important; } #x { color: blue; }");
    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p").with_id("x"));
    assert_eq!(color(&definition(&sheet, &doc, p)), Some(RED));
}

#[test]
fn test_later_load_wins() {
    let mut sheet = StyleSheet::new();
    sheet.load_style_sheet("p { color: red; }", "base.css").unwrap();
    sheet.load_style_sheet("p { color: blue; }", "theme.css").unwrap();
    sheet.build_node_index_and_optimize_properties();

    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p"));
    let definition = definition(&sheet, &doc, p);
    assert_eq!(color(&definition), Some(BLUE));
    assert_eq!(
        definition.property(PropertyId::Color).unwrap().source,
        SourceLocation::new("theme.css", 1)
    );
}

#[test]
fn test_combinators_and_pseudo_classes() {
    let sheet = sheet(
        "nav > a { color: red; }
         nav a:hover { color: blue; }
         h1 + p { opacity: 0.5; }
         h1 ~ p { font-weight: bold; }",
    );
    let mut doc = Document::new();
    let nav = doc.insert(ElementData::new("nav"));
    let direct = doc.insert_child(nav, ElementData::new("a"));
    let span = doc.insert_child(nav, ElementData::new("span"));
    let nested = doc.insert_child(span, ElementData::new("a").with_pseudo_class("hover"));

    let body = doc.insert(ElementData::new("body"));
    let _h1 = doc.insert_child(body, ElementData::new("h1"));
    let first = doc.insert_child(body, ElementData::new("p"));
    let second = doc.insert_child(body, ElementData::new("p"));

    assert_eq!(color(&definition(&sheet, &doc, direct)), Some(RED));
    assert_eq!(color(&definition(&sheet, &doc, nested)), Some(BLUE));

    let first = definition(&sheet, &doc, first);
    let second = definition(&sheet, &doc, second);
    assert_eq!(first.value(PropertyId::Opacity), Some(&PropertyValue::Number(0.5)));
    assert!(second.value(PropertyId::Opacity).is_none());
    assert!(first.value(PropertyId::FontWeight).is_some());
    assert!(second.value(PropertyId::FontWeight).is_some());

    // Toggling the pseudo-class changes the match.
    if let Some(data) = doc.get_mut(nested) {
        data.set_pseudo_class("hover", false);
    }
    assert!(definition(&sheet, &doc, nested).is_empty());
}

// ---------------------------------------------------------------------------
// Combining
// ---------------------------------------------------------------------------

#[test]
fn test_overlay_wins_at_equal_specificity() {
    let mut base = StyleSheet::new();
    base.load_style_sheet("p { color: red; }", "a.css").unwrap();
    base.load_style_sheet("span { color: red; }", "b.css").unwrap();
    let overlay = unbuilt("p { color: blue; } #x { color: green; }", "overlay.css");

    let mut combined = base.combine_style_sheet(&overlay);
    combined.build_node_index_and_optimize_properties();
    assert_eq!(combined.specificity_offset(), 3);

    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p"));
    assert_eq!(color(&definition(&combined, &doc, p)), Some(BLUE));
}

#[test]
fn test_specificity_beats_overlay() {
    let base = unbuilt("#x p { color: red; }", "base.css");
    let overlay = unbuilt("p { color: blue; }", "overlay.css");
    let mut combined = base.combine_style_sheet(&overlay);
    combined.build_node_index_and_optimize_properties();

    let mut doc = Document::new();
    let div = doc.insert(ElementData::new("div").with_id("x"));
    let p = doc.insert_child(div, ElementData::new("p"));
    assert_eq!(color(&definition(&combined, &doc, p)), Some(RED));
}

#[test]
fn test_merge_chains_never_invert() {
    let a = unbuilt("p { color: red; }", "a.css");
    let b = unbuilt("p { color: green; }", "b.css");
    let c = unbuilt("p { color: blue; }", "c.css");

    let mut left = a.combine_style_sheet(&b).combine_style_sheet(&c);
    let mut right = a.combine_style_sheet(&b.combine_style_sheet(&c));
    left.build_node_index_and_optimize_properties();
    right.build_node_index_and_optimize_properties();

    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p"));
    assert_eq!(color(&definition(&left, &doc, p)), Some(BLUE));
    assert_eq!(color(&definition(&right, &doc, p)), Some(BLUE));
    assert_eq!(left.specificity_offset(), right.specificity_offset());

    // A layer is never outranked by one that was below it.
    let mut ab = a.combine_style_sheet(&b);
    ab.build_node_index_and_optimize_properties();
    assert_eq!(color(&definition(&ab, &doc, p)), Some(GREEN));
}

#[test]
fn test_combine_leaves_inputs_untouched() {
    let mut base = sheet("p { color: red; } @keyframes k { to { opacity: 1; } }");
    let overlay = sheet("p { color: blue; } span { color: green; } @keyframes k { from { opacity: 0; } }");
    let counts = (base.rule_node_count(), base.specificity_offset());

    let mut combined = base.combine_style_sheet(&overlay);
    combined.build_node_index_and_optimize_properties();

    assert_eq!((base.rule_node_count(), base.specificity_offset()), counts);
    assert_eq!(combined.rule_node_count(), 2);
    assert_eq!(base.get_keyframes("k").unwrap().blocks[0].normalized_time, 1.0);
    assert_eq!(combined.get_keyframes("k").unwrap().blocks[0].normalized_time, 0.0);

    base.build_node_index_and_optimize_properties();
    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p"));
    assert_eq!(color(&definition(&base, &doc, p)), Some(RED));
    assert_eq!(color(&definition(&overlay, &doc, p)), Some(BLUE));
    assert_eq!(color(&definition(&combined, &doc, p)), Some(BLUE));
}

#[test]
fn test_combined_values_resolve_against_combined_tables() {
    let base = sheet("@spritesheet ui { src: ui.png; icon: 0px 0px 16px 16px; }");
    let overlay = sheet("p { decorator: image(icon); }");

    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p"));

    let alone = definition(&overlay, &doc, p);
    assert!(matches!(&alone.decorators()[0].kind, DecoratorKind::Image(ImageSource::File(f)) if f == "icon"));

    let mut combined = base.combine_style_sheet(&overlay);
    combined.build_node_index_and_optimize_properties();
    let merged = definition(&combined, &doc, p);
    assert!(matches!(&merged.decorators()[0].kind, DecoratorKind::Image(ImageSource::Sprite(_))));
}

// ---------------------------------------------------------------------------
// Decorators, keyframes, sprites
// ---------------------------------------------------------------------------

#[test]
fn test_decorator_list_skips_failures() {
    let sheet = sheet(
        "@decorator valid-decorator : gradient { direction: vertical; start-color: #fff; stop-color: #000; }
         @decorator valid-decorator-2 : image { image: panel.png; }
         p { decorator: valid-decorator, unknown-type(1), missing, valid-decorator-2; }",
    );
    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p"));
    let definition = definition(&sheet, &doc, p);

    let types: Vec<&str> = definition
        .decorators()
        .iter()
        .map(|d| d.decorator_type.as_str())
        .collect();
    assert_eq!(types, vec!["gradient", "image"]);
    assert!(Arc::ptr_eq(
        &definition.decorators()[0],
        &sheet.get_decorator("valid-decorator").unwrap()
    ));
}

#[test]
fn test_font_effects_resolve() {
    let sheet = sheet("h1 { font-effect: shadow(2px 2px #000), outline(1px white); }");
    let mut doc = Document::new();
    let h1 = doc.insert(ElementData::new("h1"));
    let types: Vec<String> = definition(&sheet, &doc, h1)
        .font_effects()
        .iter()
        .map(|e| e.effect_type.clone())
        .collect();
    assert_eq!(types, vec!["shadow".to_string(), "outline".to_string()]);
}

#[test]
fn test_animation_resolves_keyframes() {
    let sheet = sheet(
        "@keyframes fade { from { opacity: 0; } to { opacity: 1; } }
         p { animation: 1s fade, 2s nowhere, 500ms 100ms infinite fade; }",
    );
    assert_eq!(sheet.get_keyframes("fade").unwrap().blocks.len(), 2);
    assert!(sheet.get_keyframes("nowhere").is_none());

    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p"));
    let definition = definition(&sheet, &doc, p);
    let animations = definition.animations();
    assert_eq!(animations.len(), 2);
    assert_eq!(animations[0].duration, 1.0);
    assert_eq!(animations[1].iterations, Iterations::Infinite);
    assert_eq!(animations[1].keyframes.blocks.len(), 2);
}

#[test]
fn test_sprite_lookup() {
    let sheet = sheet("@spritesheet ui { src: ui.png; resolution: 2x; icon: 0px 16px 32px 32px; }");
    let sprite = sheet.get_sprite("icon").unwrap();
    assert_eq!(sprite.rectangle.y, 16.0);
    assert_eq!(sprite.sheet.image_source, "ui.png");
    assert_eq!(sprite.sheet.display_scale, 0.5);
    assert!(sheet.get_sprite("other").is_none());
}

// ---------------------------------------------------------------------------
// Load errors
// ---------------------------------------------------------------------------

#[test]
fn test_failed_load_keeps_sheet_usable() {
    let mut sheet = StyleSheet::new();
    sheet.load_style_sheet("p { color: red; }", "good.css").unwrap();
    let error = sheet.load_style_sheet("p { color: blue; ", "bad.css").unwrap_err();
    assert!(matches!(error, LoadError::Parse { .. }));
    assert!(error.to_string().contains("bad.css"));
    sheet.build_node_index_and_optimize_properties();

    let mut doc = Document::new();
    let p = doc.insert(ElementData::new("p"));
    assert_eq!(color(&definition(&sheet, &doc, p)), Some(RED));
    assert_eq!(sheet.specificity_offset(), 1);
}
