use once_cell::sync::OnceCell;

use derma_serve::store::DocumentStore;
use derma_serve::ImageClassifier;

/// Shared per-process state.
///
/// The classifier cell is written exactly once by the loader task and only
/// read afterwards; handlers never lock. An empty cell is the "loading"
/// state, a filled one is "ready". There is no transition back.
pub struct AppState {
    pub classifier: OnceCell<ImageClassifier>,
    pub documents: DocumentStore,
    pub collection: String,
}

impl AppState {
    pub fn new(documents: DocumentStore, collection: String) -> Self {
        AppState {
            classifier: OnceCell::new(),
            documents,
            collection,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.classifier.get().is_some()
    }
}
