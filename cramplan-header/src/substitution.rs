//! Substitution matrix builder and back-annotator (component C).

use cramplan_core::{Base, Error, ReadFeature, Record, UNASSIGNED_CODE};

/// Per-reference-base ranking of the other four bases, by descending
/// empirical frequency with a bytewise-ascending tie-break.
///
/// `row(r)[code]` is the base a substitution code `code` decodes to when
/// the reference base is `r`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionMatrix {
    rows: [[Base; 4]; 5],
}

impl SubstitutionMatrix {
    /// The four non-self bases for `reference`, ranked by descending
    /// frequency then ascending letter.
    pub fn row(&self, reference: Base) -> [Base; 4] {
        self.rows[reference.index()]
    }

    /// The substitution code (`0..=3`) of `read` under `reference`'s row.
    pub fn code_of(&self, reference: Base, read: Base) -> Option<u8> {
        self.row(reference)
            .iter()
            .position(|&b| b == read)
            .map(|i| i as u8)
    }
}

/// Default descending-frequency tie-break order used to total the matrix
/// for reference/read pairs the data never touches: plain ascending-letter
/// order, since all-zero frequencies tie completely.
fn default_row(reference: Base) -> [Base; 4] {
    let mut others: Vec<Base> = Base::ALL.iter().copied().filter(|&b| b != reference).collect();
    others.sort();
    [others[0], others[1], others[2], others[3]]
}

/// Build the substitution matrix from `records`' substitution read features.
///
/// A 5x5 frequency table over `{A,C,G,T,N}`, ranked per reference base by
/// descending frequency among the four non-self columns, tie-broken by
/// ascending base letter; untouched cells fall back to the canonical
/// default ranking so every row totals to a permutation of the other four
/// bases.
pub fn build(records: &[Record]) -> Result<SubstitutionMatrix, Error> {
    let mut frequencies = [[0u64; 5]; 5];

    for record in records {
        for feature in &record.read_features {
            if let ReadFeature::Substitution {
                reference_base,
                read_base,
                ..
            } = feature
            {
                let reference = Base::from_byte(*reference_base)?;
                let read = Base::from_byte(*read_base)?;
                frequencies[reference.index()][read.index()] += 1;
            }
        }
    }

    let mut rows = [[Base::A; 4]; 5];
    for reference in Base::ALL {
        let touched = Base::ALL
            .iter()
            .any(|&read| read != reference && frequencies[reference.index()][read.index()] > 0);

        rows[reference.index()] = if touched {
            let mut candidates: Vec<Base> = Base::ALL
                .iter()
                .copied()
                .filter(|&b| b != reference)
                .collect();
            candidates.sort_by(|&a, &b| {
                let freq_a = frequencies[reference.index()][a.index()];
                let freq_b = frequencies[reference.index()][b.index()];
                freq_b.cmp(&freq_a).then_with(|| a.cmp(&b))
            });
            [candidates[0], candidates[1], candidates[2], candidates[3]]
        } else {
            default_row(reference)
        };
    }

    Ok(SubstitutionMatrix { rows })
}

/// Back-annotate every substitution read feature whose code is still the
/// sentinel with its code under `matrix`.
///
/// A substitution whose reference/read base falls outside `ACGTN` is a
/// fatal input error, surfaced before any mutation completes for that
/// feature.
pub fn annotate(records: &mut [Record], matrix: &SubstitutionMatrix) -> Result<(), Error> {
    for record in records.iter_mut() {
        for feature in record.read_features.iter_mut() {
            if let ReadFeature::Substitution {
                reference_base,
                read_base,
                code,
                ..
            } = feature
            {
                if *code == UNASSIGNED_CODE {
                    let reference = Base::from_byte(*reference_base)?;
                    let read = Base::from_byte(*read_base)?;
                    *code = matrix
                        .code_of(reference, read)
                        .expect("matrix row is total over the four non-self bases") as i8;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substitution(position: i32, reference_base: u8, read_base: u8) -> ReadFeature {
        ReadFeature::Substitution {
            position,
            read_base,
            reference_base,
            code: UNASSIGNED_CODE,
        }
    }

    #[test]
    fn empty_batch_uses_the_default_ranking() {
        let matrix = build(&[]).unwrap();
        for reference in Base::ALL {
            let mut row = matrix.row(reference).to_vec();
            row.sort();
            let mut expected: Vec<Base> = Base::ALL.iter().copied().filter(|&b| b != reference).collect();
            expected.sort();
            assert_eq!(row, expected);
        }
    }

    #[test]
    fn frequent_substitution_ranks_first() {
        let mut record = Record::new();
        record.read_features.push(substitution(7, b'A', b'C'));
        for _ in 0..1000 {
            record.read_features.push(substitution(0, b'A', b'C'));
        }

        let matrix = build(std::slice::from_ref(&record)).unwrap();
        assert_eq!(matrix.code_of(Base::A, Base::C), Some(0));
    }

    #[test]
    fn back_annotation_consumes_the_sentinel() {
        let mut record = Record::new();
        record.read_features.push(substitution(7, b'A', b'C'));
        for _ in 0..1000 {
            record.read_features.push(substitution(0, b'A', b'C'));
        }

        let mut records = vec![record];
        let matrix = build(&records).unwrap();
        annotate(&mut records, &matrix).unwrap();

        for feature in &records[0].read_features {
            if let ReadFeature::Substitution { code, .. } = feature {
                assert_eq!(*code, 0);
            }
        }
    }

    #[test]
    fn invalid_base_is_rejected() {
        let mut record = Record::new();
        record.read_features.push(substitution(0, b'X', b'C'));
        let result = build(std::slice::from_ref(&record));
        assert!(result.is_err());
    }

    #[test]
    fn matrix_rows_are_permutations_of_the_other_four_bases() {
        let matrix = build(&[]).unwrap();
        for reference in Base::ALL {
            let mut row = matrix.row(reference).to_vec();
            row.sort();
            row.dedup();
            assert_eq!(row.len(), 4);
            assert!(!row.contains(&reference));
        }
    }
}
