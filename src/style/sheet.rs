//! Style sheet: load, combine, index and resolve.
//!
//! A [`StyleSheet`] owns a [`RuleTree`] plus the side tables its values refer
//! to (`@keyframes`, `@decorator`, `@spritesheet`). The lifecycle is:
//!
//! 1. [`StyleSheet::load_style_sheet`] once per source; every load is a new
//!    cascade layer above the previous ones.
//! 2. Optionally [`StyleSheet::combine_style_sheet`] to layer another sheet on
//!    top, producing a third sheet.
//! 3. [`StyleSheet::build_node_index_and_optimize_properties`] before
//!    resolving elements.
//! 4. [`StyleSheet::get_element_definition`] per element; elements matching
//!    the same rule nodes share one definition.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::Arc;

use crate::config::StyleConfig;
use crate::css::parser::{parse_css, ParseError};
use crate::css::properties::{
    parse_declaration, Property, PropertyDictionary, PropertyError, PropertyValue, SourceLocation,
};
use crate::css::specificity::{Precedence, Specificity};
use crate::dom::element::StyledElement;
use crate::style::cache::{DefinitionCache, Signature};
use crate::style::decorator::{Decorator, DecoratorList, DecoratorSpecification};
use crate::style::definition::ElementDefinition;
use crate::style::font_effect::{FontEffect, FontEffectList};
use crate::style::keyframes::{parse_animation, AnimationList, Keyframes};
use crate::style::node_index::NodeIndex;
use crate::style::registry::{InstanceError, InstancerRegistry};
use crate::style::rule_node::{RuleNodeId, RuleTree};
use crate::style::shorthand::{bind_arguments, parse_item, split_list, ListItem};
use crate::style::sprite::{Sprite, SpritesheetList};

/// Errors from loading a style sheet source.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse style sheet '{source_name}': {source}")]
    Parse {
        source_name: String,
        #[source]
        source: ParseError,
    },
    #[error("failed to read style sheet: {0}")]
    Io(#[from] std::io::Error),
}

type ShorthandKey = (String, BTreeMap<String, String>);
type InstanceCache<T> = RefCell<HashMap<ShorthandKey, Arc<T>>>;

// ---------------------------------------------------------------------------
// StyleSheet
// ---------------------------------------------------------------------------

/// A compiled set of style rules.
///
/// Not `Sync`: definition lookups update an interior cache, so concurrent
/// resolution needs an external lock.
#[derive(Debug)]
pub struct StyleSheet {
    config: StyleConfig,
    tree: RuleTree,
    /// Layer the next load will use; also how many layers this sheet spans.
    specificity_offset: u32,
    keyframes: HashMap<String, Arc<Keyframes>>,
    decorators: HashMap<String, DecoratorSpecification>,
    spritesheets: SpritesheetList,
    /// Nodes carrying properties.
    styled_index: NodeIndex,
    /// Every node, structural ones included.
    complete_index: NodeIndex,
    definitions: DefinitionCache,
    decorator_instances: InstanceCache<Decorator>,
    font_effect_instances: InstanceCache<FontEffect>,
}

impl StyleSheet {
    /// Create an empty sheet with the default config.
    pub fn new() -> Self {
        Self::with_config(StyleConfig::default())
    }

    pub fn with_config(config: StyleConfig) -> Self {
        Self {
            config,
            tree: RuleTree::new(),
            specificity_offset: 0,
            keyframes: HashMap::new(),
            decorators: HashMap::new(),
            spritesheets: SpritesheetList::new(),
            styled_index: NodeIndex::new(),
            complete_index: NodeIndex::new(),
            definitions: DefinitionCache::new(),
            decorator_instances: RefCell::default(),
            font_effect_instances: RefCell::default(),
        }
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Parse `source` and add its rules as a new layer above everything
    /// loaded so far.
    ///
    /// On a parse error nothing is added. Invalid declarations are logged
    /// and skipped without failing the load. Call
    /// [`build_node_index_and_optimize_properties`](Self::build_node_index_and_optimize_properties)
    /// afterwards.
    pub fn load_style_sheet(&mut self, source: &str, source_name: &str) -> Result<(), LoadError> {
        let parsed = parse_css(source).map_err(|error| {
            tracing::error!(source_name, %error, "failed to parse style sheet");
            LoadError::Parse {
                source_name: source_name.to_string(),
                source: error,
            }
        })?;

        let name: Arc<str> = Arc::from(source_name);
        let layer = self.specificity_offset;
        let mut order = 0u32;

        for rule in &parsed.rules {
            let mut declared = Vec::new();
            for decl in &rule.declarations {
                let location = SourceLocation::new(name.clone(), decl.line);
                match parse_declaration(decl) {
                    Ok(values) => {
                        for (id, value) in values {
                            declared.push((id, value, decl.important, order, location.clone()));
                        }
                    }
                    Err(PropertyError::UnknownProperty(property)) if self.config.warn_unknown_properties => {
                        tracing::warn!(location = %location, %property, "unknown property, ignored")
                    }
                    Err(PropertyError::UnknownProperty(property)) => {
                        tracing::debug!(location = %location, %property, "unknown property, ignored")
                    }
                    Err(error) => tracing::warn!(location = %location, %error, "invalid declaration, ignored"),
                }
                order = order.saturating_add(1);
            }

            for selector in &rule.selectors {
                let specificity = Specificity::from_selector(selector);
                let mut properties = PropertyDictionary::new();
                for (id, value, important, order, location) in &declared {
                    let precedence = Precedence::new(specificity, layer, *order).with_important(*important);
                    properties.set(*id, Property::new(value.clone(), precedence, location.clone()));
                }
                self.tree.insert(selector, &properties);
            }
        }

        for rule in &parsed.keyframes {
            let keyframes = Keyframes::from_rule(rule, &name);
            if self.keyframes.insert(rule.name.clone(), Arc::new(keyframes)).is_some() {
                tracing::debug!(source_name, keyframes = %rule.name, "keyframes redefined");
            }
        }
        for rule in &parsed.decorators {
            self.decorators
                .insert(rule.name.clone(), DecoratorSpecification::from_rule(rule, &name));
        }
        for rule in &parsed.spritesheets {
            self.spritesheets.add_rule(rule, &name);
        }

        // Newly loaded tables may change what a list value resolves to;
        // everything re-instances on the next build.
        self.tree.reset_deferred();
        for specification in self.decorators.values_mut() {
            *specification = specification.clone();
        }
        self.decorator_instances.borrow_mut().clear();
        self.font_effect_instances.borrow_mut().clear();
        self.definitions.clear();
        self.specificity_offset = self.specificity_offset.saturating_add(1);

        tracing::debug!(
            source_name,
            rules = parsed.rules.len(),
            keyframes = parsed.keyframes.len(),
            decorators = parsed.decorators.len(),
            spritesheets = parsed.spritesheets.len(),
            layer,
            "style sheet loaded"
        );
        Ok(())
    }

    /// Read `reader` to the end and load it as [`load_style_sheet`](Self::load_style_sheet) does.
    pub fn load_from_reader<R: Read>(&mut self, mut reader: R, source_name: &str) -> Result<(), LoadError> {
        let mut source = String::new();
        reader.read_to_string(&mut source).map_err(|error| {
            tracing::error!(source_name, %error, "failed to read style sheet");
            error
        })?;
        self.load_style_sheet(&source, source_name)
    }

    // ── Combining ────────────────────────────────────────────────────

    /// A new sheet with `overlay` layered on top of this one.
    ///
    /// Every overlay declaration outranks every declaration of `self` with
    /// equal importance and specificity; overlay keyframes, decorators and
    /// sprites replace ours by name. Neither input is modified. The result
    /// needs its own index build.
    pub fn combine_style_sheet(&self, overlay: &StyleSheet) -> StyleSheet {
        let mut tree = self.tree.clone();
        tree.merge(&overlay.tree, self.specificity_offset);
        // Instances may reference the inputs' sprites and keyframes.
        tree.reset_deferred();

        let mut keyframes = self.keyframes.clone();
        keyframes.extend(overlay.keyframes.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut decorators = self.decorators.clone();
        decorators.extend(overlay.decorators.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut spritesheets = self.spritesheets.clone();
        spritesheets.merge(&overlay.spritesheets);

        let specificity_offset = self.specificity_offset.saturating_add(overlay.specificity_offset);
        tracing::debug!(
            base_layers = self.specificity_offset,
            overlay_layers = overlay.specificity_offset,
            rule_nodes = tree.len(),
            "style sheets combined"
        );

        StyleSheet {
            tree,
            specificity_offset,
            keyframes,
            decorators,
            spritesheets,
            ..StyleSheet::with_config(self.config.clone())
        }
    }

    // ── Indexing ─────────────────────────────────────────────────────

    /// Rebuild the node indices, instance every unresolved decorator,
    /// font-effect and animation value in place, and drop cached
    /// definitions. Idempotent.
    pub fn build_node_index_and_optimize_properties(&mut self) {
        self.styled_index.clear();
        self.complete_index.clear();
        self.definitions.clear();

        for (id, node) in self.tree.iter() {
            self.complete_index.insert(node.qualifier(), id);
            if !node.properties().is_empty() {
                self.styled_index.insert(node.qualifier(), id);
            }
        }

        let instancer = Instancer {
            registry: &self.config.registry,
            decorators: &self.decorators,
            sprites: &self.spritesheets,
            keyframes: &self.keyframes,
            decorator_instances: &self.decorator_instances,
            font_effect_instances: &self.font_effect_instances,
        };
        for properties in self.tree.properties_mut() {
            instancer.resolve(properties);
        }

        tracing::debug!(
            rule_nodes = self.complete_index.len(),
            styled_nodes = self.styled_index.len(),
            "node index built"
        );
    }

    // ── Resolution ───────────────────────────────────────────────────

    /// The compiled definition for `element`.
    ///
    /// Elements matching the same set of rule nodes get the same `Arc`. An
    /// element matching nothing gets an empty definition.
    pub fn get_element_definition<E: StyledElement>(&self, element: &E) -> Arc<ElementDefinition> {
        let matching: Vec<RuleNodeId> = self
            .styled_index
            .candidates(element)
            .into_iter()
            .filter(|&node| self.tree.is_applicable(node, element))
            .collect();

        self.definitions
            .get_or_insert_with(Signature::new(matching), |signature| self.compile(signature))
    }

    fn compile(&self, signature: &Signature) -> ElementDefinition {
        let mut properties = PropertyDictionary::new();
        for &node in signature.nodes() {
            if let Some(node) = self.tree.get(node) {
                properties.merge(node.properties());
            }
        }
        // Only reached when the index was built before a value resolved.
        self.instancer().resolve(&mut properties);

        tracing::debug!(rule_nodes = signature.nodes().len(), properties = properties.len(), "compiled element definition");
        ElementDefinition::new(properties)
    }

    /// Whether `element` matches a rule node that other selectors continue
    /// from, so that changing its classes or state can restyle its
    /// descendants or later siblings.
    pub fn affects_descendants<E: StyledElement>(&self, element: &E) -> bool {
        self.complete_index.candidates(element).into_iter().any(|node| {
            self.tree.get(node).is_some_and(|n| !n.children().is_empty()) && self.tree.is_applicable(node, element)
        })
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn get_keyframes(&self, name: &str) -> Option<&Keyframes> {
        self.keyframes.get(name).map(Arc::as_ref)
    }

    /// The shared instance of the `@decorator` named `name`, built on first
    /// request. `None` if no such decorator exists or it fails to build.
    pub fn get_decorator(&self, name: &str) -> Option<Arc<Decorator>> {
        self.decorators.get(name)?.instance(&self.config.registry, &self.spritesheets)
    }

    pub fn get_sprite(&self, name: &str) -> Option<&Sprite> {
        self.spritesheets.get_sprite(name)
    }

    /// Instance a `decorator` value such as `bg, gradient(vertical #fff #000)`.
    /// Items that fail are logged against `source` and left out.
    pub fn instance_decorators_from_string(&self, value: &str, source: &SourceLocation) -> DecoratorList {
        self.instancer().decorators(value, source)
    }

    /// Instance a `font-effect` value such as `shadow(1px 1px #000)`.
    /// Items that fail are logged against `source` and left out.
    pub fn instance_font_effects_from_string(&self, value: &str, source: &SourceLocation) -> FontEffectList {
        self.instancer().font_effects(value, source)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn specificity_offset(&self) -> u32 {
        self.specificity_offset
    }

    /// Number of rule nodes, the root excluded.
    pub fn rule_node_count(&self) -> usize {
        self.tree.len()
    }

    pub fn rule_tree(&self) -> &RuleTree {
        &self.tree
    }

    pub fn styled_index(&self) -> &NodeIndex {
        &self.styled_index
    }

    pub fn complete_index(&self) -> &NodeIndex {
        &self.complete_index
    }

    fn instancer(&self) -> Instancer<'_> {
        Instancer {
            registry: &self.config.registry,
            decorators: &self.decorators,
            sprites: &self.spritesheets,
            keyframes: &self.keyframes,
            decorator_instances: &self.decorator_instances,
            font_effect_instances: &self.font_effect_instances,
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Instancer
// ---------------------------------------------------------------------------

/// Borrowed view of the tables list values resolve against. Kept apart from
/// the rule tree so tree nodes can be resolved in place.
struct Instancer<'a> {
    registry: &'a InstancerRegistry,
    decorators: &'a HashMap<String, DecoratorSpecification>,
    sprites: &'a SpritesheetList,
    keyframes: &'a HashMap<String, Arc<Keyframes>>,
    decorator_instances: &'a InstanceCache<Decorator>,
    font_effect_instances: &'a InstanceCache<FontEffect>,
}

impl Instancer<'_> {
    fn resolve(&self, properties: &mut PropertyDictionary) {
        for (_, property) in properties.iter_mut() {
            let Property { value, source, .. } = property;
            match value {
                PropertyValue::Decorators(d) if !d.is_resolved() => {
                    let list = self.decorators(d.raw(), source);
                    d.resolve(list);
                }
                PropertyValue::FontEffects(d) if !d.is_resolved() => {
                    let list = self.font_effects(d.raw(), source);
                    d.resolve(list);
                }
                PropertyValue::Animations(d) if !d.is_resolved() => {
                    let list = self.animations(d.raw(), source);
                    d.resolve(list);
                }
                _ => {}
            }
        }
    }

    fn decorators(&self, value: &str, source: &SourceLocation) -> DecoratorList {
        if is_none(value) {
            return DecoratorList::default();
        }
        split_list(value)
            .into_iter()
            .filter_map(|item| {
                let result = parse_item(item).and_then(|parsed| match parsed {
                    ListItem::Name(name) => {
                        let specification = self
                            .decorators
                            .get(name)
                            .ok_or_else(|| InstanceError::UnknownName(name.to_string()))?;
                        // Build failures are logged by the specification.
                        Ok(specification.instance(self.registry, self.sprites))
                    }
                    ListItem::Shorthand { type_name, args } => {
                        let ty = self.registry.decorator(type_name).ok_or_else(|| InstanceError::UnknownType {
                            kind: "decorator",
                            name: type_name.to_string(),
                        })?;
                        let key = (type_name.to_string(), bind_arguments(type_name, ty.shorthand, &args)?);
                        cached(self.decorator_instances, key, |(type_name, properties)| {
                            self.registry.instance_decorator(type_name, properties, self.sprites)
                        })
                        .map(Some)
                    }
                });
                result.unwrap_or_else(|error| {
                    tracing::warn!(location = %source, item, %error, "decorator skipped");
                    None
                })
            })
            .collect()
    }

    /// Font effects have no named form; a bare name is a shorthand without
    /// arguments.
    fn font_effects(&self, value: &str, source: &SourceLocation) -> FontEffectList {
        if is_none(value) {
            return FontEffectList::default();
        }
        split_list(value)
            .into_iter()
            .filter_map(|item| {
                let result = parse_item(item).and_then(|parsed| {
                    let (type_name, args) = match parsed {
                        ListItem::Name(name) => (name, Vec::new()),
                        ListItem::Shorthand { type_name, args } => (type_name, args),
                    };
                    let ty = self.registry.font_effect(type_name).ok_or_else(|| InstanceError::UnknownType {
                        kind: "font effect",
                        name: type_name.to_string(),
                    })?;
                    let key = (type_name.to_string(), bind_arguments(type_name, ty.shorthand, &args)?);
                    cached(self.font_effect_instances, key, |(type_name, properties)| {
                        self.registry.instance_font_effect(type_name, properties, self.sprites)
                    })
                });
                result
                    .map_err(|error| tracing::warn!(location = %source, item, %error, "font effect skipped"))
                    .ok()
            })
            .collect()
    }

    fn animations(&self, value: &str, source: &SourceLocation) -> AnimationList {
        if is_none(value) {
            return AnimationList::new();
        }
        split_list(value)
            .into_iter()
            .filter_map(|item| {
                parse_animation(item, self.keyframes)
                    .map_err(|error| tracing::warn!(location = %source, item, %error, "animation skipped"))
                    .ok()
            })
            .collect()
    }
}

fn is_none(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("none")
}

/// Look up `key`, building and storing the instance on a miss.
fn cached<T>(
    cache: &InstanceCache<T>,
    key: ShorthandKey,
    build: impl FnOnce(&ShorthandKey) -> Result<T, InstanceError>,
) -> Result<Arc<T>, InstanceError> {
    if let Some(hit) = cache.borrow().get(&key) {
        return Ok(hit.clone());
    }
    let instance = Arc::new(build(&key)?);
    cache.borrow_mut().insert(key, instance.clone());
    Ok(instance)
}
