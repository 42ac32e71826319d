/*!
 * Schema definitions for doctor input files
 *
 * Input files have no fixed layout. Only the columns needed to build a
 * registry query are required; everything else passes through untouched.
 */

use crate::constants::{FIELD_FIRST_NAME, FIELD_LAST_NAME, FIELD_NPI, FIELD_STATE};

/// Input file schema
pub struct InputSchema;

impl InputSchema {
    /// Columns every input file must carry
    pub fn required_columns() -> Vec<&'static str> {
        vec![FIELD_FIRST_NAME, FIELD_LAST_NAME, FIELD_STATE]
    }

    /// Required columns absent from `headers`, in declaration order
    pub fn missing_columns(headers: &[String]) -> Vec<String> {
        Self::required_columns()
            .into_iter()
            .filter(|required| !headers.iter().any(|h| h == required))
            .map(str::to_string)
            .collect()
    }

    pub fn validate_headers(headers: &[String]) -> Result<(), crate::NpiFinderError> {
        let missing = Self::missing_columns(headers);

        if !missing.is_empty() {
            return Err(crate::NpiFinderError::MissingColumns {
                missing,
                found: headers.to_vec(),
            });
        }

        Ok(())
    }
}

/// Output file schema
pub struct OutputSchema;

impl OutputSchema {
    /// Output columns: the input header set with the NPI column appended once
    pub fn column_names(input_headers: &[String]) -> Vec<String> {
        let mut columns = input_headers.to_vec();
        if !columns.iter().any(|c| c == FIELD_NPI) {
            columns.push(FIELD_NPI.to_string());
        }
        columns
    }
}
