use crate::atom::{Atom, AtomKey, Children};
use crate::error::{Error, Result};

/// Walk an ordered key sequence through nested containers.
///
/// Fails with [`Error::AtomNotFound`] if any key is absent at its level,
/// and with [`Error::NotAContainer`] if the path continues past a leaf.
pub fn lookup<'a>(root: &'a Children, path: &[AtomKey]) -> Result<&'a Atom> {
    let (first, rest) = path
        .split_first()
        .ok_or_else(|| Error::AtomNotFound("(empty path)".into()))?;

    let mut atom = root
        .get(*first)
        .ok_or_else(|| Error::AtomNotFound(render(path, 1)))?;

    for (i, key) in rest.iter().enumerate() {
        let kids = atom
            .children()
            .ok_or_else(|| Error::NotAContainer(render(path, i + 1)))?;
        atom = kids
            .get(*key)
            .ok_or_else(|| Error::AtomNotFound(render(path, i + 2)))?;
    }
    Ok(atom)
}

/// Mutable variant of [`lookup`]; used to rewrite a node's payload in
/// place while preserving its key and position.
pub fn lookup_mut<'a>(root: &'a mut Children, path: &[AtomKey]) -> Result<&'a mut Atom> {
    let (first, rest) = path
        .split_first()
        .ok_or_else(|| Error::AtomNotFound("(empty path)".into()))?;

    let mut atom = root
        .get_mut(*first)
        .ok_or_else(|| Error::AtomNotFound(render(path, 1)))?;

    for (i, key) in rest.iter().enumerate() {
        let kids = match atom.children_mut() {
            Some(kids) => kids,
            None => return Err(Error::NotAContainer(render(path, i + 1))),
        };
        atom = match kids.get_mut(*key) {
            Some(a) => a,
            None => return Err(Error::AtomNotFound(render(path, i + 2))),
        };
    }
    Ok(atom)
}

// Render the first `upto` keys as e.g. "trak[1].mdia[0].mdhd[0]".
fn render(path: &[AtomKey], upto: usize) -> String {
    path[..upto]
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(".")
}
