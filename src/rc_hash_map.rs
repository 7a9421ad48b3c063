use core::{
	borrow::Borrow,
	hash::{BuildHasher, Hash},
};
use hashbrown::{hash_map::Entry, DefaultHashBuilder, HashMap};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

/// A map with a reference count per entry. Entries are only removed by [`RcHashMap::drain_weak`].
pub struct RcHashMap<K, C, V, S = DefaultHashBuilder>(HashMap<K, (C, V), S>)
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher;
impl<K, C, V, S> Default for RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: Default + BuildHasher,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, C, V, S> RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher,
{
	#[must_use]
	pub fn new() -> Self
	where
		S: Default,
	{
		Self(HashMap::with_hasher(S::default()))
	}

	pub fn increment_or_insert_with<F: FnOnce(&K) -> V>(&mut self, k: K, v: F) -> Result<&mut V, CountSaturatedError> {
		match self.0.entry(k) {
			Entry::Occupied(occupied) => {
				let (c, v) = occupied.into_mut();
				*c = c.checked_add(&C::one()).ok_or(CountSaturatedError)?;
				Ok(v)
			}
			Entry::Vacant(vacant) => {
				let v = v(vacant.key());
				let (_, v) = vacant.insert((C::one(), v));
				Ok(v)
			}
		}
	}

	/// Decrements without removing. Entries with a count of zero are still reachable until drained.
	pub fn weak_decrement<Q: ?Sized>(&mut self, k: &Q) -> Result<Option<&mut V>, CountSaturatedError>
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		match self.0.get_mut(k) {
			Some((c, v)) => {
				*c = c.checked_sub(&C::one()).ok_or(CountSaturatedError)?;
				Ok(Some(v))
			}
			None => Ok(None),
		}
	}

	pub fn get<Q: ?Sized>(&self, k: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		self.0.get(k).map(|(_, v)| v)
	}

	/// Removes and yields every entry whose count is zero.
	pub fn drain_weak(&mut self) -> impl Iterator<Item = (K, V)> + '_ {
		self.0.extract_if(|_, (c, _)| c.is_zero()).map(|(k, (_, v))| (k, v))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}
}

#[derive(Debug)]
pub struct CountSaturatedError;

#[cfg(test)]
mod tests {
	use super::RcHashMap;

	#[test]
	fn drains_only_unreferenced_entries() {
		let mut map = RcHashMap::<&str, u8, i32>::new();
		map.increment_or_insert_with("a", |_| 1).unwrap();
		map.increment_or_insert_with("b", |_| 2).unwrap();
		map.increment_or_insert_with("b", |_| unreachable!()).unwrap();

		assert_eq!(map.weak_decrement("a").unwrap(), Some(&mut 1));
		assert_eq!(map.weak_decrement("b").unwrap(), Some(&mut 2));
		assert_eq!(map.drain_weak().collect::<Vec<_>>(), vec![("a", 1)]);
		assert_eq!(map.get("b"), Some(&2));
		assert_eq!(map.len(), 1);
	}

	#[test]
	fn decrementing_past_zero_is_an_error() {
		let mut map = RcHashMap::<u32, u8, ()>::new();
		map.increment_or_insert_with(7, |_| ()).unwrap();
		assert!(map.weak_decrement(&7).is_ok());
		assert!(map.weak_decrement(&7).is_err());
		assert!(map.weak_decrement(&8).unwrap().is_none());
	}
}
