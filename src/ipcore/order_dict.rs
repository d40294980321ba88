use std::{borrow::Borrow, collections::HashMap, hash::Hash};

/// Dictionary remembering the insertion order of its keys
#[derive(Clone, Debug)]
pub struct OrderDict<K,V> {
    index: HashMap<K,usize>,
    entries: Vec<(K,V)>
}

impl<K,V> Default for OrderDict<K,V>
    where K: Eq + Hash + Clone
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K,V> OrderDict<K,V>
    where K: Eq + Hash + Clone
{

    pub fn new() -> Self {
        OrderDict { index: HashMap::new(), entries: Vec::new() }
    }

    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where K: Borrow<Q>, Q: Hash + Eq + ?Sized
    {
        self.index.contains_key(k)
    }

    pub fn insert(&mut self, k: K, v: V) {
        match self.index.get(&k) {
            Some(i) => self.entries[*i].1 = v,
            None => {
                self.index.insert(k.clone(), self.entries.len());
                self.entries.push((k,v));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where K: Borrow<Q>, Q: Hash + Eq + ?Sized
    {
        let i = self.index.get(k)?;
        Some(&self.entries[*i].1)
    }

    pub fn entry(&mut self, key: &K) -> &mut V
    where V: Default {
        let idx = match self.index.get(key) {
            Some(i) => *i,
            None => {
                self.insert(key.clone(), V::default());
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    /// Key/Value pairs in insertion order
    pub fn items(&self) -> impl Iterator<Item=(&K,&V)> {
        self.entries.iter().map(|(k,v)| (k,v))
    }
}

impl<K> OrderDict<K,usize>
    where K: Eq + Hash + Clone
{
    /// Entry with the highest count, the first inserted wins ties
    pub fn max_count(&self) -> Option<(&K,usize)> {
        let mut best : Option<(&K,usize)> = None;
        for (k,v) in self.items() {
            if best.map(|(_,n)| *v > n).unwrap_or(true) {
                best = Some((k,*v));
            }
        }
        best
    }
}
