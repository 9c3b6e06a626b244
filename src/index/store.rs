//! Document store: source documents addressed by dense document number

use roaring::RoaringBitmap;
use std::collections::HashMap;

use super::types::DocNo;
use crate::models::{Document, DocumentId};

#[derive(Clone, Debug, Default)]
pub struct DocumentStore {
    docs: Vec<Document>,
    ids: HashMap<DocumentId, DocNo>,
    all: RoaringBitmap,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document number the next stored document receives
    pub fn next_docno(&self) -> DocNo {
        DocNo(self.docs.len() as u32)
    }

    /// Take ownership of a document
    pub fn insert(&mut self, doc: Document) -> DocNo {
        let docno = self.next_docno();
        self.ids.insert(doc.id, docno);
        self.all.insert(docno.as_u32());
        self.docs.push(doc);
        docno
    }

    pub fn get(&self, docno: DocNo) -> Option<&Document> {
        self.docs.get(docno.as_usize())
    }

    pub fn docno(&self, id: DocumentId) -> Option<DocNo> {
        self.ids.get(&id).copied()
    }

    pub fn by_id(&self, id: DocumentId) -> Option<&Document> {
        self.docno(id).and_then(|docno| self.get(docno))
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.ids.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Every stored document number
    pub fn all_docs(&self) -> &RoaringBitmap {
        &self.all
    }
}
