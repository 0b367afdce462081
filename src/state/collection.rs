use std::fmt;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::request_state::{RequestId, RequestItem};

pub const SCHEMA_V2_1: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderId(Uuid);

impl FolderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FolderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One request sequence: the collection's top level or a single folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    TopLevel,
    Folder(FolderId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub name: String,
    pub schema: String,
    /// `_postman_id`, `description` and friends.
    pub rest: Map<String, Value>,
}

impl CollectionInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: SCHEMA_V2_1.to_string(),
            rest: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub items: Vec<RequestItem>,
    /// Unmodelled folder fields (`description`, `auth`, `event`, ...).
    pub rest: Map<String, Value>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: FolderId::new(),
            name: name.into(),
            items: Vec::new(),
            rest: Map::new(),
        }
    }
}

/// The tree being edited. Top-level requests and folders are kept apart; the
/// exported document lists the requests first, then the folders.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub info: CollectionInfo,
    pub requests: Vec<RequestItem>,
    pub folders: Vec<Folder>,
    /// Collection-level fields such as `variable`, `auth` or `event`.
    pub rest: Map<String, Value>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: CollectionInfo::new(name),
            requests: Vec::new(),
            folders: Vec::new(),
            rest: Map::new(),
        }
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn folder_index(&self, id: FolderId) -> Option<usize> {
        self.folders.iter().position(|f| f.id == id)
    }

    pub fn scope_items(&self, scope: Scope) -> Option<&Vec<RequestItem>> {
        match scope {
            Scope::TopLevel => Some(&self.requests),
            Scope::Folder(id) => self.folder(id).map(|f| &f.items),
        }
    }

    pub fn scope_items_mut(&mut self, scope: Scope) -> Option<&mut Vec<RequestItem>> {
        match scope {
            Scope::TopLevel => Some(&mut self.requests),
            Scope::Folder(id) => self
                .folders
                .iter_mut()
                .find(|f| f.id == id)
                .map(|f| &mut f.items),
        }
    }

    /// Finds the scope holding `id` and its position inside that scope.
    pub fn locate(&self, id: RequestId) -> Option<(Scope, usize)> {
        if let Some(idx) = self.requests.iter().position(|r| r.id == id) {
            return Some((Scope::TopLevel, idx));
        }
        self.folders.iter().find_map(|folder| {
            folder
                .items
                .iter()
                .position(|r| r.id == id)
                .map(|idx| (Scope::Folder(folder.id), idx))
        })
    }

    pub fn request(&self, id: RequestId) -> Option<&RequestItem> {
        let (scope, idx) = self.locate(id)?;
        self.scope_items(scope)?.get(idx)
    }

    pub fn request_mut(&mut self, id: RequestId) -> Option<&mut RequestItem> {
        let (scope, idx) = self.locate(id)?;
        self.scope_items_mut(scope)?.get_mut(idx)
    }

    /// Every request, top level first, then folder by folder.
    pub fn all_requests(&self) -> impl Iterator<Item = &RequestItem> {
        self.requests
            .iter()
            .chain(self.folders.iter().flat_map(|f| f.items.iter()))
    }
}
