//! Associations: the variable tables that drive quantification and
//! substitution.
//!
//! An association maps a set of variables to images. For [`Bdd::exists`],
//! [`Bdd::forall`] and [`Bdd::rel_prod`] only the domain matters (the
//! quantified variables). [`Bdd::substitute`] replaces each variable by its
//! image function, [`Bdd::var_substitute`] requires the images to be
//! variables.
//!
//! Associations are registered with the manager and addressed by
//! [`AssocId`]. Registering a table equal to an existing one returns the
//! existing id and bumps its count. One association is *current*; the
//! association-driven operations read it. The temporary association
//! ([`AssocId::TEMPORARY`]) can be rebuilt in place and is current when
//! nothing else has been selected.
//!
//! ```
//! use cal_bdd::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let x = bdd.new_var_last().unwrap();
//! let y = bdd.new_var_last().unwrap();
//! let f = x.and(&y).unwrap();
//!
//! let id = bdd.association_init_vars(&[x.id().unwrap()]).unwrap();
//! bdd.association_set_current(id).unwrap();
//! assert_eq!(f.exists().unwrap(), y);
//! ```

use std::fmt;

use log::debug;

use crate::bdd::Bdd;
use crate::error::{BddError, Result};
use crate::function::Function;
use crate::reference::Ref;
use crate::types::{Level, Var};

/// Identifier of a registered association.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AssocId(usize);

impl AssocId {
    /// The temporary association, always registered.
    pub const TEMPORARY: AssocId = AssocId(0);

    pub fn index(self) -> usize {
        self.0
    }

    pub fn is_temporary(self) -> bool {
        self == Self::TEMPORARY
    }
}

impl fmt::Display for AssocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_temporary() {
            write!(f, "#temp")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

#[derive(Debug, Clone)]
struct Association {
    /// Sorted by variable id, no duplicates.
    pairs: Vec<(Var, Ref)>,
    /// Changes whenever the content changes; part of cache keys.
    stamp: u32,
    /// Number of `association_init` calls sharing this entry.
    count: usize,
}

/// The association table of a manager.
#[derive(Debug)]
pub(crate) struct Associations {
    /// Slot 0 is the temporary association.
    table: Vec<Option<Association>>,
    current: AssocId,
    next_stamp: u32,
}

impl Associations {
    pub(crate) fn new() -> Self {
        let temporary = Association {
            pairs: Vec::new(),
            stamp: 0,
            count: 1,
        };
        Self {
            table: vec![Some(temporary)],
            current: AssocId::TEMPORARY,
            next_stamp: 1,
        }
    }

    fn fresh_stamp(&mut self) -> u32 {
        let stamp = self.next_stamp;
        self.next_stamp = self.next_stamp.wrapping_add(1);
        stamp
    }

    fn get(&self, id: AssocId) -> Result<&Association> {
        self.table
            .get(id.0)
            .and_then(|a| a.as_ref())
            .ok_or(BddError::UnknownAssociation { id: id.0 })
    }

    fn get_mut(&mut self, id: AssocId) -> Result<&mut Association> {
        self.table
            .get_mut(id.0)
            .and_then(|a| a.as_mut())
            .ok_or(BddError::UnknownAssociation { id: id.0 })
    }

    fn find(&self, pairs: &[(Var, Ref)]) -> Option<AssocId> {
        self.table
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, a)| a.as_ref().is_some_and(|a| a.pairs == pairs))
            .map(|(i, _)| AssocId(i))
    }

    fn register(&mut self, pairs: Vec<(Var, Ref)>) -> AssocId {
        let association = Association {
            pairs,
            stamp: self.fresh_stamp(),
            count: 1,
        };
        match self.table.iter().skip(1).position(|a| a.is_none()) {
            Some(i) => {
                self.table[i + 1] = Some(association);
                AssocId(i + 1)
            }
            None => {
                self.table.push(Some(association));
                AssocId(self.table.len() - 1)
            }
        }
    }
}

/// The current association, resolved against the current order.
#[derive(Debug, Clone)]
pub(crate) struct AssocView {
    pub stamp: u32,
    /// Image of each variable, indexed by variable id; `INVALID` when the
    /// variable is not in the association.
    pub images: Vec<Ref>,
    /// Whether each level holds a variable of the association.
    pub quantified: Vec<bool>,
    /// The lowest level holding a variable of the association.
    pub max_level: Option<Level>,
}

impl AssocView {
    pub fn is_quantified(&self, level: Level) -> bool {
        !level.is_terminal() && self.quantified[level.index()]
    }

    /// Whether nothing at or below `level` is in the association.
    pub fn is_below(&self, level: Level) -> bool {
        match self.max_level {
            Some(max) => level > max,
            None => true,
        }
    }

    pub fn image(&self, var: u32) -> Option<Ref> {
        self.images.get(var as usize).copied().filter(|r| !r.is_invalid())
    }
}

impl Bdd {
    fn validate_pairs(&self, pairs: &[(Var, &Function<'_>)]) -> Result<Vec<(Var, Ref)>> {
        let mut table = Vec::with_capacity(pairs.len());
        for &(var, image) in pairs {
            if self.var_ref(var).is_err() {
                return Err(BddError::invalid_association(format!("unknown variable {}", var)));
            }
            if image.edge().is_invalid() {
                return Err(BddError::invalid_association(format!("{} is mapped to null", var)));
            }
            self.check_operand(image)?;
            table.push((var, image.edge()));
        }
        table.sort_by_key(|&(var, _)| var);
        if let Some(w) = table.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(BddError::invalid_association(format!("{} appears twice", w[0].0)));
        }
        Ok(table)
    }

    /// Register an association mapping each variable to its image.
    ///
    /// An equal association already registered is shared: its id is
    /// returned and [`Bdd::association_quit`] must be called once more
    /// before it goes away.
    ///
    /// # Errors
    ///
    /// [`BddError::InvalidAssociation`] for an unknown or repeated variable
    /// or a null image, [`BddError::ForeignManager`] for an image owned by
    /// another manager.
    pub fn association_init(&self, pairs: &[(Var, &Function<'_>)]) -> Result<AssocId> {
        let table = self.validate_pairs(pairs)?;
        let mut associations = self.associations.borrow_mut();
        if let Some(id) = associations.find(&table) {
            associations.get_mut(id)?.count += 1;
            debug!("Association {} shared", id);
            return Ok(id);
        }
        for &(_, image) in &table {
            self.ref_inc(image);
        }
        let id = associations.register(table);
        debug!("Association {} registered", id);
        Ok(id)
    }

    /// Register a quantification set: every variable is paired with `ONE`.
    pub fn association_init_vars(&self, vars: &[Var]) -> Result<AssocId> {
        let one = self.one();
        let pairs: Vec<_> = vars.iter().map(|&v| (v, &one)).collect();
        self.association_init(&pairs)
    }

    /// Release one registration of `id`.
    ///
    /// When the last registration goes away the images are released, and if
    /// `id` was current the temporary association becomes current.
    pub fn association_quit(&self, id: AssocId) -> Result<()> {
        if id.is_temporary() {
            return Err(BddError::invalid_argument("the temporary association cannot be released"));
        }
        let released = {
            let mut associations = self.associations.borrow_mut();
            let association = associations.get_mut(id)?;
            association.count -= 1;
            if association.count > 0 {
                return Ok(());
            }
            if associations.current == id {
                associations.current = AssocId::TEMPORARY;
            }
            associations.table[id.0].take()
        };
        if let Some(association) = released {
            for (_, image) in association.pairs {
                self.ref_dec(image);
            }
        }
        debug!("Association {} released", id);
        Ok(())
    }

    /// Make `id` the current association, returning the previous one.
    pub fn association_set_current(&self, id: AssocId) -> Result<AssocId> {
        let mut associations = self.associations.borrow_mut();
        associations.get(id)?;
        Ok(std::mem::replace(&mut associations.current, id))
    }

    pub fn current_association(&self) -> AssocId {
        self.associations.borrow().current
    }

    /// Variables of association `id`, with their images.
    pub fn association_pairs(&self, id: AssocId) -> Result<Vec<(Var, Function<'_>)>> {
        let pairs = self.associations.borrow().get(id)?.pairs.clone();
        Ok(pairs.into_iter().map(|(v, r)| (v, Function::new(self, r))).collect())
    }

    /// Replace the content of the temporary association and make it current.
    pub fn temp_association_init(&self, pairs: &[(Var, &Function<'_>)]) -> Result<()> {
        let table = self.validate_pairs(pairs)?;
        for &(_, image) in &table {
            self.ref_inc(image);
        }
        let old = {
            let mut associations = self.associations.borrow_mut();
            let stamp = associations.fresh_stamp();
            associations.current = AssocId::TEMPORARY;
            let temporary = associations.get_mut(AssocId::TEMPORARY)?;
            temporary.stamp = stamp;
            std::mem::replace(&mut temporary.pairs, table)
        };
        for (_, image) in old {
            self.ref_dec(image);
        }
        self.cache.borrow_mut().clear();
        Ok(())
    }

    /// Add pairs to the temporary association. A variable already present
    /// takes the new image.
    pub fn temp_association_augment(&self, pairs: &[(Var, &Function<'_>)]) -> Result<()> {
        let added = self.validate_pairs(pairs)?;
        for &(_, image) in &added {
            self.ref_inc(image);
        }
        let mut replaced = Vec::new();
        {
            let mut associations = self.associations.borrow_mut();
            let stamp = associations.fresh_stamp();
            let temporary = associations.get_mut(AssocId::TEMPORARY)?;
            temporary.stamp = stamp;
            for (var, image) in added {
                match temporary.pairs.binary_search_by_key(&var, |&(v, _)| v) {
                    Ok(i) => replaced.push(std::mem::replace(&mut temporary.pairs[i].1, image)),
                    Err(i) => temporary.pairs.insert(i, (var, image)),
                }
            }
        }
        for image in replaced {
            self.ref_dec(image);
        }
        self.cache.borrow_mut().clear();
        Ok(())
    }

    /// Empty the temporary association.
    pub fn temp_association_quit(&self) {
        let old = {
            let mut associations = self.associations.borrow_mut();
            let stamp = associations.fresh_stamp();
            let Ok(temporary) = associations.get_mut(AssocId::TEMPORARY) else {
                return;
            };
            temporary.stamp = stamp;
            std::mem::take(&mut temporary.pairs)
        };
        for (_, image) in old {
            self.ref_dec(image);
        }
        self.cache.borrow_mut().clear();
    }

    /// Resolve the current association against the current variable order.
    pub(crate) fn current_view(&self) -> AssocView {
        let associations = self.associations.borrow();
        let mut images = vec![Ref::INVALID; self.num_vars() + 1];
        let mut quantified = vec![false; self.num_vars()];
        let mut max_level = None;
        let (stamp, pairs) = match associations.get(associations.current) {
            Ok(a) => (a.stamp, a.pairs.as_slice()),
            Err(_) => (0, &[][..]),
        };
        for &(var, image) in pairs {
            images[var.index()] = image;
            let level = self.level_of_unchecked(var);
            quantified[level.index()] = true;
            max_level = max_level.max(Some(level));
        }
        AssocView {
            stamp,
            images,
            quantified,
            max_level,
        }
    }
}
