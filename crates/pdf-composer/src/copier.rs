use lopdf::{Document, Object, ObjectId};
use std::collections::HashMap;

/// Copies objects between documents, following references.
///
/// Each source object is copied once; its target id is registered before
/// recursing so reference cycles terminate.
pub(crate) struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    pub fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self {
            source,
            target,
            id_map: HashMap::new(),
        }
    }

    pub fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        let new_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source.get_object(source_id)?.clone();
        let remapped = self.remap(obj)?;
        match self.target.objects.get_mut(&new_id) {
            Some(slot) => *slot = remapped,
            None => return Err(lopdf::Error::ObjectNotFound(new_id)),
        }
        Ok(new_id)
    }

    /// Rewrites every reference inside `obj` to its copy in the target.
    ///
    /// Dictionary entries are visited in key order so that the ids handed
    /// out do not depend on how the source happened to order its keys.
    pub fn remap(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(items) => items
                .into_iter()
                .map(|o| self.remap(o))
                .collect::<Result<Vec<_>, _>>()
                .map(Object::Array),
            Object::Dictionary(mut dict) => {
                self.remap_entries(&mut dict)?;
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                self.remap_entries(&mut stream.dict)?;
                Ok(Object::Stream(stream))
            }
            other => Ok(other),
        }
    }

    fn remap_entries(&mut self, dict: &mut lopdf::Dictionary) -> Result<(), lopdf::Error> {
        let mut keys: Vec<Vec<u8>> = dict.iter().map(|(k, _)| k.clone()).collect();
        keys.sort();
        for key in keys {
            if let Ok(value) = dict.get(&key) {
                let remapped = self.remap(value.clone())?;
                dict.set(key, remapped);
            }
        }
        Ok(())
    }
}
