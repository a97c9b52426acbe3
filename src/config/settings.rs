use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_NODE_ID: &str = "local";

const NODE_ID_KEY: &str = "NODE_ID";

/// Runtime settings for a node, seeded from environment variables.
/// Protocol constants live in the parent module; this map only holds
/// per-process values.
pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut node_id = String::from(DEFAULT_NODE_ID);
        if let Ok(id) = env::var(NODE_ID_KEY) {
            node_id = id;
        }

        let mut map = HashMap::new();
        map.insert(String::from(NODE_ID_KEY), node_id);

        Config {
            inner: RwLock::new(map),
        }
    }

    pub fn get_node_id(&self) -> String {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(NODE_ID_KEY)
            .expect("Node id should always be present in config")
            .clone()
    }

    pub fn set_node_id(&self, node_id: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(NODE_ID_KEY), node_id);
    }
}
