use sha2::{Digest, Sha256};

use super::parser::FormSubmission;
use super::tracks::TrackForm;
use super::validate::is_checked;

/// Hash of the normalized submission. Identical input on the same track always
/// yields the same key, so a resubmission maps onto the existing row.
///
/// Every part is length-prefixed, so no field value can imitate a boundary.
/// Attachments contribute their file name and a digest of their bytes.
pub fn key(form: &TrackForm, input: &FormSubmission) -> String {
    let mut hasher = Sha256::new();
    write_part(&mut hasher, form.track.as_str().as_bytes());

    let mut names: Vec<&str> = form.fields.iter().map(|f| f.name).collect();
    names.sort_unstable();
    for name in names {
        write_part(&mut hasher, name.as_bytes());
        write_part(&mut hasher, input.field(name).trim().as_bytes());
    }

    let mut checked: Vec<&str> = form
        .eligibility
        .iter()
        .filter(|cb| is_checked(input.fields.get(cb.name).map(String::as_str)))
        .map(|cb| cb.key)
        .collect();
    checked.sort_unstable();
    write_part(&mut hasher, &(checked.len() as u64).to_be_bytes());
    for key in checked {
        write_part(&mut hasher, key.as_bytes());
    }

    for slot in form.attachments {
        write_part(&mut hasher, slot.role.as_bytes());
        match input.files.get(slot.field) {
            Some(file) => {
                write_part(&mut hasher, file.file_name.as_bytes());
                write_part(&mut hasher, &Sha256::digest(&file.data));
            }
            None => {
                write_part(&mut hasher, b"");
                write_part(&mut hasher, b"");
            }
        }
    }

    hex::encode(hasher.finalize())
}

fn write_part(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
