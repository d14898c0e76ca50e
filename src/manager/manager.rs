use std::cell::{
    Ref,
    RefCell,
    RefMut
};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::managererror::ManagerError;
use super::namedobject::NamedObject;

pub trait IManager<V>
where
    V: Clone + NamedObject
{
    fn map(&self) -> Ref<'_, HashMap<String, V>>;

    fn map_mut(&self) -> RefMut<'_, HashMap<String, V>>;

    fn obj_from_json(&self, json_value: serde_json::Value) -> Result<V, ManagerError>;

    /// 插入前的檢查（例如保留名稱）；預設不做任何檢查。
    fn check_name(&self, _name: &str) -> Result<(), ManagerError> {
        Ok(())
    }

    fn insert(&self, obj: V) -> Result<(), ManagerError> {
        self.check_name(obj.name())?;
        self.map_mut().insert(obj.name().to_owned(), obj);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<V, ManagerError> {
        self.map()
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::map_elem_not_found(name))
    }

    fn contains(&self, name: &str) -> bool {
        self.map().contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map().keys().cloned().collect();
        names.sort();
        names
    }

    fn insert_obj_from_json(&self, json_value: serde_json::Value) -> Result<(), ManagerError> {
        let obj = self.obj_from_json(json_value)?;
        self.insert(obj)
    }

    fn insert_obj_from_json_vec(&self, json_vec: &[serde_json::Value]) -> Result<(), ManagerError> {
        for j in json_vec.iter() {
            self.insert_obj_from_json(j.clone())?;
        }
        Ok(())
    }

    /// 讀取單一物件或物件陣列的 JSON 檔。
    fn from_reader<P>(&self, file_path: P) -> Result<(), ManagerError>
    where
        P: AsRef<Path>
    {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let json_value: serde_json::Value = serde_json::from_reader(reader)?;
        if json_value.is_array() {
            let json_array: Vec<serde_json::Value> = ManagerError::from_json_or_json_parse_error(json_value)?;
            self.insert_obj_from_json_vec(&json_array)
        } else {
            self.insert_obj_from_json(json_value)
        }
    }
}

pub struct Manager<V> {
    map_cell: RefCell<HashMap<String, V>>,
    get_obj_from_json: fn(serde_json::Value) -> Result<V, ManagerError>,
    reserved: fn(&str) -> bool
}

impl<V> Manager<V>
where
    V: Clone + NamedObject
{
    pub fn new(get_obj_from_json: fn(serde_json::Value) -> Result<V, ManagerError>) -> Manager<V> {
        Manager::with_reserved_names(get_obj_from_json, |_| false)
    }

    pub fn with_reserved_names(
        get_obj_from_json: fn(serde_json::Value) -> Result<V, ManagerError>,
        reserved: fn(&str) -> bool,
    ) -> Manager<V> {
        Manager {
            map_cell: RefCell::new(HashMap::new()),
            get_obj_from_json,
            reserved
        }
    }
}

impl<V> IManager<V> for Manager<V>
where
    V: Clone + NamedObject
{
    fn map(&self) -> Ref<'_, HashMap<String, V>> {
        self.map_cell.borrow()
    }

    fn map_mut(&self) -> RefMut<'_, HashMap<String, V>> {
        self.map_cell.borrow_mut()
    }

    fn obj_from_json(&self, json_value: serde_json::Value) -> Result<V, ManagerError> {
        (self.get_obj_from_json)(json_value)
    }

    fn check_name(&self, name: &str) -> Result<(), ManagerError> {
        if (self.reserved)(name) {
            return Err(ManagerError::ReservedNameError(name.to_owned()));
        }
        Ok(())
    }
}
