//! The editable folder/request hierarchy.
//!
//! Every [`RequestItem`] lives in exactly one scope: the collection's top-level
//! sequence or one folder's items. Items and folders are addressed by id, so a
//! selection keeps pointing at the same logical item whatever happens to the
//! positions around it.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::state::collection::{Collection, Folder, FolderId, Scope};
use crate::state::request_state::{RequestId, RequestItem};
use crate::storage::postman;

/// Transient "what is the user looking at" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub scope: Scope,
    pub request: Option<RequestId>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionTree {
    collection: Option<Collection>,
    selection: Selection,
}

impl CollectionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.collection.is_some()
    }

    /// Replaces everything with the collection in `doc`. On a parse failure the
    /// current state is left untouched.
    pub fn load(&mut self, doc: &str) -> Result<()> {
        let value: Value = serde_json::from_str(doc)?;
        self.load_value(value)
    }

    pub fn load_value(&mut self, value: Value) -> Result<()> {
        let collection = postman::from_document(value)?;
        debug!(
            name = %collection.info.name,
            folders = collection.folders.len(),
            top_level = collection.requests.len(),
            "collection loaded"
        );
        self.selection = Selection {
            scope: collection
                .folders
                .first()
                .map_or(Scope::TopLevel, |f| Scope::Folder(f.id)),
            request: None,
        };
        self.collection = Some(collection);
        Ok(())
    }

    /// Postman v2.1 document of the current state, `None` before anything exists.
    pub fn export(&self) -> Option<Value> {
        self.collection.as_ref().map(postman::to_document)
    }

    /// Pretty JSON of one request item, as it would appear in the document.
    pub fn export_request(&self, id: RequestId) -> Result<String> {
        let item = self.request(id).ok_or_else(|| unknown_request(id))?;
        Ok(serde_json::to_string_pretty(&postman::item_to_value(item))?)
    }

    /// A one-item collection around `id`, for running a single request through a batch runner.
    pub fn single_request_collection(&self, id: RequestId) -> Result<Value> {
        let collection = self.collection.as_ref().ok_or_else(|| unknown_request(id))?;
        let item = collection.request(id).ok_or_else(|| unknown_request(id))?;
        let mut mini = Collection::new(if item.name.is_empty() {
            "Single Request"
        } else {
            item.name.as_str()
        });
        mini.info.schema = collection.info.schema.clone();
        mini.requests.push(item.clone());
        Ok(postman::to_document(&mini))
    }

    pub fn rename_collection(&mut self, name: impl Into<String>) {
        self.ensure_collection().info.name = name.into();
    }

    pub fn folders(&self) -> &[Folder] {
        self.collection.as_ref().map_or(&[], |c| c.folders.as_slice())
    }

    pub fn requests(&self, scope: Scope) -> &[RequestItem] {
        self.collection
            .as_ref()
            .and_then(|c| c.scope_items(scope))
            .map_or(&[], Vec::as_slice)
    }

    pub fn request(&self, id: RequestId) -> Option<&RequestItem> {
        self.collection.as_ref()?.request(id)
    }

    pub fn locate(&self, id: RequestId) -> Option<(Scope, usize)> {
        self.collection.as_ref()?.locate(id)
    }

    // --- Folders ---

    pub fn add_folder(&mut self, name: &str) -> Result<FolderId> {
        self.check_folder_name(name, None)?;
        let folder = Folder::new(name);
        let id = folder.id;
        self.ensure_collection().folders.push(folder);
        debug!(%id, name, "folder added");
        Ok(id)
    }

    pub fn rename_folder(&mut self, id: FolderId, name: &str) -> Result<()> {
        self.check_folder_name(name, Some(id))?;
        let folder = self
            .collection
            .as_mut()
            .and_then(|c| c.folders.iter_mut().find(|f| f.id == id))
            .ok_or_else(|| unknown_folder(id))?;
        folder.name = name.to_string();
        Ok(())
    }

    /// Removes the folder and its requests. A selection inside it falls back to
    /// the first remaining folder, or the top level when none is left.
    pub fn delete_folder(&mut self, id: FolderId) -> Result<Folder> {
        let collection = self.collection.as_mut().ok_or_else(|| unknown_folder(id))?;
        let idx = collection.folder_index(id).ok_or_else(|| unknown_folder(id))?;
        let removed = collection.folders.remove(idx);

        if self.selection.scope == Scope::Folder(id) {
            self.selection = Selection {
                scope: collection
                    .folders
                    .first()
                    .map_or(Scope::TopLevel, |f| Scope::Folder(f.id)),
                request: None,
            };
        }
        debug!(%id, name = %removed.name, "folder deleted");
        Ok(removed)
    }

    pub fn move_folder(&mut self, id: FolderId, to: usize) -> Result<()> {
        let collection = self.collection.as_mut().ok_or_else(|| unknown_folder(id))?;
        let from = collection.folder_index(id).ok_or_else(|| unknown_folder(id))?;
        splice_move(&mut collection.folders, from, to);
        Ok(())
    }

    // --- Requests ---

    /// Appends a default request to `scope` and selects it.
    pub fn add_request(&mut self, scope: Scope) -> Result<RequestId> {
        if matches!(scope, Scope::Folder(_)) && !self.is_loaded() {
            return Err(unknown_scope(scope));
        }
        let items = self
            .ensure_collection()
            .scope_items_mut(scope)
            .ok_or_else(|| unknown_scope(scope))?;
        let item = RequestItem::default();
        let id = item.id;
        items.push(item);
        self.selection = Selection {
            scope,
            request: Some(id),
        };
        debug!(%id, ?scope, "request added");
        Ok(id)
    }

    /// Inserts a deep copy right after the source; earlier positions are unchanged.
    pub fn duplicate_request(&mut self, id: RequestId) -> Result<RequestId> {
        let (scope, idx) = self.locate(id).ok_or_else(|| unknown_request(id))?;
        let items = self.scope_items_mut(scope)?;
        let copy = items[idx].duplicate();
        let copy_id = copy.id;
        items.insert(idx + 1, copy);
        debug!(source = %id, copy = %copy_id, "request duplicated");
        Ok(copy_id)
    }

    pub fn remove_request(&mut self, id: RequestId) -> Result<RequestItem> {
        let (scope, idx) = self.locate(id).ok_or_else(|| unknown_request(id))?;
        let removed = self.scope_items_mut(scope)?.remove(idx);
        if self.selection.request == Some(id) {
            self.selection.request = None;
        }
        debug!(%id, "request removed");
        Ok(removed)
    }

    /// Reorders within the request's own scope. `to` is clamped to the scope length.
    pub fn move_request(&mut self, id: RequestId, to: usize) -> Result<()> {
        let (scope, from) = self.locate(id).ok_or_else(|| unknown_request(id))?;
        splice_move(self.scope_items_mut(scope)?, from, to);
        Ok(())
    }

    /// A detached copy for editing; nothing changes until [`commit_edit`](Self::commit_edit).
    pub fn begin_edit(&self, id: RequestId) -> Result<RequestItem> {
        self.request(id).cloned().ok_or_else(|| unknown_request(id))
    }

    /// Replaces the stored request carrying the draft's id. Header rows that would
    /// never be sent (empty key or value, disabled) are dropped on the way in.
    pub fn commit_edit(&mut self, mut draft: RequestItem) -> Result<()> {
        let id = draft.id;
        let slot = self
            .collection
            .as_mut()
            .and_then(|c| c.request_mut(id))
            .ok_or_else(|| unknown_request(id))?;
        draft.headers.retain(|h| h.is_effective());
        *slot = draft;
        debug!(%id, "request saved");
        Ok(())
    }

    // --- Selection ---

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn select_scope(&mut self, scope: Scope) -> Result<()> {
        if let Scope::Folder(id) = scope {
            self.collection
                .as_ref()
                .and_then(|c| c.folder(id))
                .ok_or_else(|| unknown_folder(id))?;
        }
        self.selection = Selection {
            scope,
            request: None,
        };
        Ok(())
    }

    pub fn select_request(&mut self, id: RequestId) -> Result<()> {
        let (scope, _) = self.locate(id).ok_or_else(|| unknown_request(id))?;
        self.selection = Selection {
            scope,
            request: Some(id),
        };
        Ok(())
    }

    /// Position of the selected request inside its scope, recomputed on every call.
    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selection.request?;
        self.locate(id).map(|(_, idx)| idx)
    }

    pub fn selected_request(&self) -> Option<&RequestItem> {
        self.request(self.selection.request?)
    }

    fn ensure_collection(&mut self) -> &mut Collection {
        self.collection
            .get_or_insert_with(|| Collection::new("Untitled Collection"))
    }

    fn scope_items_mut(&mut self, scope: Scope) -> Result<&mut Vec<RequestItem>> {
        self.collection
            .as_mut()
            .and_then(|c| c.scope_items_mut(scope))
            .ok_or_else(|| unknown_scope(scope))
    }

    fn check_folder_name(&self, name: &str, except: Option<FolderId>) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidName(name.to_string()));
        }
        let taken = self
            .folders()
            .iter()
            .any(|f| f.name == name && Some(f.id) != except);
        if taken {
            warn!(name, "rejected duplicate folder name");
            return Err(Error::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

fn splice_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() {
        return;
    }
    let moved = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, moved);
}

fn unknown_request(id: RequestId) -> Error {
    Error::UnknownRequest(id.to_string())
}

fn unknown_folder(id: FolderId) -> Error {
    Error::UnknownFolder(id.to_string())
}

fn unknown_scope(scope: Scope) -> Error {
    match scope {
        Scope::Folder(id) => unknown_folder(id),
        Scope::TopLevel => Error::UnknownFolder("top level".into()),
    }
}
