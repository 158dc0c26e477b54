//! # 贴图分类目录
//!
//! 分类以名称标识，比较时忽略首尾空白与大小写。
//! 目录内部保持有序，查找走二分，未命中时按序插入。

use std::cmp::Ordering;

/// 贴图分类。
#[derive(Debug, Clone)]
pub struct TexturesCategory {
    name: String,
    key: String,
}

impl TexturesCategory {
    pub fn new(name: &str) -> Self {
        let name = name.trim().to_string();
        let key = name.to_lowercase();
        Self { name, key }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for TexturesCategory {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TexturesCategory {}

impl PartialOrd for TexturesCategory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TexturesCategory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// 有序分类集合。
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    categories: Vec<TexturesCategory>,
}

impl CategoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut catalog = Self::new();
        for name in names {
            catalog.lookup_or_insert(name);
        }
        catalog
    }

    pub fn categories(&self) -> &[TexturesCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// 按名称查找已有分类。
    pub fn find(&self, name: &str) -> Option<&TexturesCategory> {
        let probe = TexturesCategory::new(name);
        self.categories
            .binary_search(&probe)
            .ok()
            .map(|index| &self.categories[index])
    }

    /// 查找分类，不存在时插入新分类。返回目录中保存的那一份。
    pub fn lookup_or_insert(&mut self, name: &str) -> TexturesCategory {
        let probe = TexturesCategory::new(name);
        match self.categories.binary_search(&probe) {
            Ok(index) => self.categories[index].clone(),
            Err(index) => {
                log::debug!("🗂️ 新建贴图分类：{}", probe.name());
                self.categories.insert(index, probe.clone());
                probe
            }
        }
    }
}
