//! Aggregation pipeline builders.
//!
//! Every filtered pipeline starts with the same three stages:
//!
//! 1. `$match` on the whole document. Array semantics make `brand.name $in`
//!    true when any entry matches, so this is a superset of the final rows
//!    and lets the server use an index on `year` / `brand.name`.
//! 2. `$unwind: "$brand"`, one document per brand entry.
//! 3. `$match` again, now exact per flattened row.
//!
//! Numeric fields go through `$toDouble` so decimal, integer and double
//! encodings all decode the same way.

use carlens_core::{VehicleFilter, UNKNOWN_FUEL};
use mongodb::bson::{doc, Bson, Document};

fn match_stage(filter: &VehicleFilter) -> Document {
    doc! {
        "$match": {
            "year": { "$gte": filter.years.min, "$lte": filter.years.max },
            "brand.name": { "$in": filter.brand_list() },
        }
    }
}

fn unwind_brand() -> Document {
    doc! { "$unwind": "$brand" }
}

fn to_double(path: &str) -> Document {
    doc! { "$toDouble": path }
}

/// Pre-match, unwind, exact match.
#[must_use]
pub fn filtered(filter: &VehicleFilter) -> Vec<Document> {
    let stage = match_stage(filter);
    vec![stage.clone(), unwind_brand(), stage]
}

#[must_use]
pub fn filter_options() -> Vec<Document> {
    vec![
        unwind_brand(),
        doc! {
            "$group": {
                "_id": Bson::Null,
                "minYear": { "$min": "$year" },
                "maxYear": { "$max": "$year" },
                "brands": { "$addToSet": "$brand.name" },
            }
        },
    ]
}

#[must_use]
pub fn overview(filter: &VehicleFilter) -> Vec<Document> {
    let mut pipeline = filtered(filter);
    pipeline.push(doc! {
        "$group": {
            "_id": Bson::Null,
            "totalCars": { "$sum": 1 },
            "avgPrice": { "$avg": to_double("$price") },
            "avgHorsepower": { "$avg": to_double("$specifications.horsepower") },
            "brands": { "$addToSet": "$brand.name" },
        }
    });
    pipeline.push(doc! {
        "$project": {
            "_id": 0,
            "totalCars": 1,
            "avgPrice": 1,
            "avgHorsepower": 1,
            "brandCount": { "$size": "$brands" },
        }
    });
    pipeline
}

#[must_use]
pub fn price_distribution(filter: &VehicleFilter) -> Vec<Document> {
    let mut pipeline = filtered(filter);
    pipeline.push(doc! {
        "$project": {
            "_id": 0,
            "brandName": "$brand.name",
            "price": to_double("$price"),
        }
    });
    pipeline
}

#[must_use]
pub fn fuel_distribution(filter: &VehicleFilter) -> Vec<Document> {
    let mut pipeline = filtered(filter);
    pipeline.push(doc! {
        "$group": {
            "_id": { "$ifNull": ["$fuelType", UNKNOWN_FUEL] },
            "count": { "$sum": 1 },
            "avgPrice": { "$avg": to_double("$price") },
        }
    });
    pipeline.push(doc! { "$sort": { "_id": 1 } });
    pipeline
}

#[must_use]
pub fn correlation_rows(filter: &VehicleFilter) -> Vec<Document> {
    let mut pipeline = filtered(filter);
    pipeline.push(doc! {
        "$project": {
            "_id": 0,
            "price": to_double("$price"),
            "horsepower": to_double("$specifications.horsepower"),
            "torque": to_double("$specifications.torque"),
            "engineDisplacement": to_double("$specifications.engineDisplacement"),
        }
    });
    pipeline
}

#[must_use]
pub fn vehicle_rows(filter: &VehicleFilter) -> Vec<Document> {
    let mut pipeline = filtered(filter);
    pipeline.push(doc! {
        "$project": {
            "_id": 0,
            "brandName": "$brand.name",
            "year": 1,
            "price": to_double("$price"),
            "fuelType": { "$ifNull": ["$fuelType", UNKNOWN_FUEL] },
            "horsepower": to_double("$specifications.horsepower"),
            "torque": to_double("$specifications.torque"),
            "engineDisplacement": to_double("$specifications.engineDisplacement"),
            "mileage": to_double("$specifications.mileage"),
            "model": 1,
            "color": 1,
            "transmission": 1,
        }
    });
    pipeline
}

#[cfg(test)]
mod tests {
    use carlens_core::YearRange;

    use super::*;

    fn toyota_honda() -> VehicleFilter {
        VehicleFilter::new(YearRange::new(2020, 2022), ["Toyota", "Honda"]).unwrap()
    }

    fn stage_names(pipeline: &[Document]) -> Vec<&str> {
        pipeline
            .iter()
            .map(|stage| stage.keys().next().map_or("", String::as_str))
            .collect()
    }

    #[test]
    fn filtered_unwinds_between_matches() {
        let pipeline = filtered(&toyota_honda());
        assert_eq!(stage_names(&pipeline), vec!["$match", "$unwind", "$match"]);
        assert_eq!(pipeline[1], doc! { "$unwind": "$brand" });
        assert_eq!(pipeline[0], pipeline[2]);
    }

    #[test]
    fn match_stage_uses_inclusive_bounds_and_sorted_brands() {
        let pipeline = filtered(&toyota_honda());
        let expected = doc! {
            "$match": {
                "year": { "$gte": 2020, "$lte": 2022 },
                "brand.name": { "$in": ["Honda", "Toyota"] },
            }
        };
        assert_eq!(pipeline[2], expected);
    }

    #[test]
    fn overview_groups_then_projects() {
        let pipeline = overview(&toyota_honda());
        assert_eq!(
            stage_names(&pipeline),
            vec!["$match", "$unwind", "$match", "$group", "$project"]
        );
    }

    #[test]
    fn fuel_groups_missing_as_unknown() {
        let pipeline = fuel_distribution(&toyota_honda());
        let group = pipeline[3].get_document("$group").unwrap();
        assert_eq!(
            group.get("_id"),
            Some(&Bson::Document(doc! { "$ifNull": ["$fuelType", "Unknown"] }))
        );
        assert_eq!(stage_names(&pipeline).last(), Some(&"$sort"));
    }

    #[test]
    fn projections_flatten_specifications() {
        let pipeline = correlation_rows(&toyota_honda());
        let project = pipeline[3].get_document("$project").unwrap();
        assert_eq!(
            project.get_document("engineDisplacement").unwrap(),
            &doc! { "$toDouble": "$specifications.engineDisplacement" }
        );
    }

    #[test]
    fn vehicle_table_keeps_descriptive_fields() {
        let pipeline = vehicle_rows(&toyota_honda());
        let project = pipeline[3].get_document("$project").unwrap();
        for field in ["model", "color", "transmission"] {
            assert_eq!(project.get_i32(field), Ok(1), "{field}");
        }
    }

    #[test]
    fn filter_options_reads_whole_collection() {
        let pipeline = filter_options();
        assert_eq!(stage_names(&pipeline), vec!["$unwind", "$group"]);
    }

    #[test]
    fn every_filtered_pipeline_shares_the_prefix() {
        let f = toyota_honda();
        let prefix = filtered(&f);
        for pipeline in [
            overview(&f),
            price_distribution(&f),
            fuel_distribution(&f),
            correlation_rows(&f),
            vehicle_rows(&f),
        ] {
            assert_eq!(&pipeline[..3], prefix.as_slice());
        }
    }
}
