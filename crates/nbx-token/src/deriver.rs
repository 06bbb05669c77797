use std::collections::BTreeMap;

use nbx_bundle::Manifest;
use nbx_crypto::ContentHasher;
use nbx_types::{Address, BundleKind, SlotKind, Token, TokenLevel};
use serde::Serialize;

use crate::error::{TokenError, TokenResult};
use crate::tokens::EntryTokens;

/// Identity fields of a manifest header.
#[derive(Serialize)]
struct Header<'a> {
    kind: BundleKind,
    name: &'a str,
    properties: &'a BTreeMap<String, String>,
}

/// Identity fields of one slot. The resource path is not part of identity.
#[derive(Serialize)]
struct DeclaredSlot<'a> {
    name: &'a str,
    kind: SlotKind,
}

fn header(manifest: &Manifest) -> Header<'_> {
    Header {
        kind: manifest.kind,
        name: &manifest.name,
        properties: &manifest.properties,
    }
}

fn declared_slots(manifest: &Manifest) -> Vec<DeclaredSlot<'_>> {
    manifest
        .slots
        .iter()
        .map(|s| DeclaredSlot {
            name: &s.name,
            kind: s.kind,
        })
        .collect()
}

/// Token of a leaf: its content address.
pub fn leaf_token(address: &Address) -> Token {
    Token::from(*address)
}

/// Hash `declared` fields followed by each child token, in order, in the
/// domain of `level`.
pub fn composite_token<D: Serialize + ?Sized>(
    level: TokenLevel,
    declared: &D,
    children: &[Token],
) -> TokenResult<Token> {
    let fields =
        bincode::serialize(declared).map_err(|e| TokenError::Serialization(e.to_string()))?;
    let mut stream = ContentHasher::for_level(level).stream();
    stream.update(&fields);
    for child in children {
        stream.update(child.as_bytes());
    }
    Ok(Token::from(stream.finalize()))
}

pub(crate) fn module_set_token(manifest: &Manifest, modules: &[Token]) -> TokenResult<Token> {
    composite_token(TokenLevel::ModuleSet, &declared_slots(manifest), modules)
}

pub(crate) fn component_token(manifest: &Manifest, module_set: Token) -> TokenResult<Token> {
    composite_token(TokenLevel::ComponentBundle, &header(manifest), &[module_set])
}

pub(crate) fn application_token(manifest: &Manifest, components: &[Token]) -> TokenResult<Token> {
    composite_token(
        TokenLevel::Application,
        &(header(manifest), declared_slots(manifest)),
        components,
    )
}

pub(crate) fn web_application_token(
    manifest: &Manifest,
    application: Token,
    ui: Token,
) -> TokenResult<Token> {
    composite_token(
        TokenLevel::WebApplication,
        &(header(manifest), declared_slots(manifest)),
        &[application, ui],
    )
}

/// Position of the single slot of `kind` in a web-application manifest.
pub(crate) fn slot_index(manifest: &Manifest, kind: SlotKind) -> TokenResult<usize> {
    manifest
        .slots
        .iter()
        .position(|s| s.kind == kind)
        .ok_or_else(|| TokenError::ShapeMismatch {
            reason: format!("{} manifest has no {kind} slot", manifest.kind),
        })
}

/// Compute every token for `manifest`.
///
/// `children` holds one token per slot, in slot order: the leaf token for
/// modules and UI assets, the child's root token for nested bundles.
pub fn derive(manifest: &Manifest, children: &[Token]) -> TokenResult<EntryTokens> {
    manifest
        .validate_shape()
        .map_err(|e| TokenError::ShapeMismatch {
            reason: e.to_string(),
        })?;
    if children.len() != manifest.slots.len() {
        return Err(TokenError::ShapeMismatch {
            reason: format!(
                "{} slots but {} child tokens",
                manifest.slots.len(),
                children.len()
            ),
        });
    }

    let tokens = match manifest.kind {
        BundleKind::Component => {
            let module_set = module_set_token(manifest, children)?;
            EntryTokens::Component {
                module_set,
                component: component_token(manifest, module_set)?,
            }
        }
        BundleKind::Application => EntryTokens::Application {
            components: children.to_vec(),
            application: application_token(manifest, children)?,
        },
        BundleKind::WebApplication => {
            let application = children[slot_index(manifest, SlotKind::ApplicationBundle)?];
            let ui = children[slot_index(manifest, SlotKind::UiAsset)?];
            EntryTokens::WebApplication {
                application,
                ui,
                web_application: web_application_token(manifest, application, ui)?,
            }
        }
    };
    Ok(tokens)
}
