//! CRUD service integration tests against the in-memory store.

mod common;

use std::sync::Arc;

use care_directory_core::domain::{
    BulkUpdateOutcome, CabinetPatch, DoctorPatch, PharmacyPatch, Region, Speciality,
};
use care_directory_core::filter::{CabinetFilter, DoctorFilter};
use care_directory_core::geo::GeoPoint;
use care_directory_core::page::PageRequest;
use care_directory_core::ports::PortError;
use care_directory_core::services::{CabinetService, DoctorService, PharmacyService};
use common::{new_cabinet, new_doctor, new_pharmacy, InMemoryStore};

fn services(store: &InMemoryStore) -> (PharmacyService, CabinetService, DoctorService) {
    let shared = Arc::new(store.clone());
    (
        PharmacyService::new(shared.clone()),
        CabinetService::new(shared.clone()),
        DoctorService::new(shared.clone(), shared),
    )
}

//=========================================================================================
// Pharmacies
//=========================================================================================

#[tokio::test]
async fn test_create_pharmacy_at_taken_location_conflicts() {
    let store = InMemoryStore::new();
    let (pharmacies, _, _) = services(&store);

    pharmacies
        .create(new_pharmacy("Pharmacie Centrale", 18.08, -15.97, true))
        .await
        .unwrap();
    let err = pharmacies
        .create(new_pharmacy("Another Name", 18.08, -15.97, false))
        .await
        .unwrap_err();

    assert!(matches!(err, PortError::Conflict(_)));
    assert_eq!(store.pharmacy_count(), 1);
}

#[tokio::test]
async fn test_create_pharmacy_validates_input() {
    let store = InMemoryStore::new();
    let (pharmacies, _, _) = services(&store);

    let err = pharmacies
        .create(new_pharmacy("  ", 18.0, -15.9, true))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::InvalidInput(_)));
    assert_eq!(store.pharmacy_count(), 0);
}

#[tokio::test]
async fn test_get_missing_pharmacy_is_not_found() {
    let store = InMemoryStore::new();
    let (pharmacies, _, _) = services(&store);

    assert!(matches!(pharmacies.get(42).await, Err(PortError::NotFound(_))));
    assert!(matches!(pharmacies.delete(42).await, Err(PortError::NotFound(_))));
    assert!(matches!(
        pharmacies.update(42, PharmacyPatch::default()).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_get_with_distance_only_when_origin_given() {
    let store = InMemoryStore::new();
    let (pharmacies, _, _) = services(&store);
    let created = pharmacies
        .create(new_pharmacy("Equator", 0.0, 1.0, true))
        .await
        .unwrap();

    let plain = pharmacies.get_with_distance(created.id, None).await.unwrap();
    assert_eq!(plain.distance_km, None);

    let ranked = pharmacies
        .get_with_distance(created.id, Some(GeoPoint::new(0.0, 0.0)))
        .await
        .unwrap();
    assert_eq!(ranked.distance_km, Some(111.19));
}

#[tokio::test]
async fn test_update_overwrites_present_fields_and_always_applies_flag() {
    let store = InMemoryStore::new();
    let (pharmacies, _, _) = services(&store);
    let created = pharmacies
        .create(new_pharmacy("Pharmacie Centrale", 18.08, -15.97, true))
        .await
        .unwrap();

    let patch = PharmacyPatch {
        region: Some(Region::Trarza),
        image: Some("front.jpg".to_string()),
        open_tonight: false,
        ..Default::default()
    };
    let updated = pharmacies.update(created.id, patch).await.unwrap();

    assert_eq!(updated.name, "Pharmacie Centrale");
    assert_eq!(updated.region, Region::Trarza);
    assert_eq!(updated.image.as_deref(), Some("front.jpg"));
    assert_eq!((updated.latitude, updated.longitude), (18.08, -15.97));
    assert!(!updated.open_tonight);
    assert!(!store.raw_pharmacy(created.id).unwrap().open_tonight);
}

#[tokio::test]
async fn test_bulk_update_with_partial_match_reports_rows_changed() {
    let store = InMemoryStore::new();
    let (pharmacies, _, _) = services(&store);
    let a = pharmacies.create(new_pharmacy("A", 18.01, -15.9, false)).await.unwrap();
    let b = pharmacies.create(new_pharmacy("B", 18.02, -15.9, false)).await.unwrap();

    let outcome = pharmacies
        .update_open_status_bulk(&[a.id, b.id, 999], true)
        .await
        .unwrap();

    assert_eq!(outcome, BulkUpdateOutcome::Updated(2));
    assert!(store.raw_pharmacy(a.id).unwrap().open_tonight);
    assert!(store.raw_pharmacy(b.id).unwrap().open_tonight);
}

#[tokio::test]
async fn test_bulk_update_matching_nothing_is_distinguishable() {
    let store = InMemoryStore::new();
    let (pharmacies, _, _) = services(&store);

    let outcome = pharmacies
        .update_open_status_bulk(&[1000, 1001], true)
        .await
        .unwrap();
    assert_eq!(outcome, BulkUpdateOutcome::NothingUpdated);

    let err = pharmacies.update_open_status_bulk(&[], true).await.unwrap_err();
    assert!(matches!(err, PortError::InvalidInput(_)));
}

#[tokio::test]
async fn test_list_all_ignores_opening_status() {
    let store = InMemoryStore::new();
    let (pharmacies, _, _) = services(&store);
    pharmacies.create(new_pharmacy("A", 18.01, -15.9, false)).await.unwrap();
    pharmacies.create(new_pharmacy("B", 18.02, -15.9, true)).await.unwrap();

    let page = pharmacies.list_all(&PageRequest::default()).await.unwrap();
    assert_eq!(page.total_elements, 2);
}

//=========================================================================================
// Cabinets
//=========================================================================================

#[tokio::test]
async fn test_cabinet_conflicts_and_filtering() {
    let store = InMemoryStore::new();
    let (_, cabinets, _) = services(&store);

    cabinets.create(new_cabinet("Cabinet Ibn Sina", 18.05, -15.95)).await.unwrap();
    cabinets.create(new_cabinet("Cabinet Avicenne", 18.06, -15.95)).await.unwrap();

    let err = cabinets
        .create(new_cabinet("Cabinet Ibn Sina", 18.05, -15.95))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Conflict(_)));

    let filter = CabinetFilter::parse(Some("sina"), None, None).unwrap();
    let page = cabinets.list(&filter, &PageRequest::default()).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].name, "Cabinet Ibn Sina");
}

#[tokio::test]
async fn test_cabinet_patch_keeps_absent_fields() {
    let store = InMemoryStore::new();
    let (_, cabinets, _) = services(&store);
    let cabinet = cabinets.create(new_cabinet("Cabinet Ibn Sina", 18.05, -15.95)).await.unwrap();

    let updated = cabinets
        .update(
            cabinet.id,
            CabinetPatch {
                latitude: Some(18.07),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Cabinet Ibn Sina");
    assert_eq!(updated.latitude, 18.07);
    assert_eq!(updated.longitude, -15.95);
}

#[tokio::test]
async fn test_deleting_a_cabinet_removes_its_doctors() {
    let store = InMemoryStore::new();
    let (_, cabinets, doctors) = services(&store);
    let cabinet = cabinets.create(new_cabinet("Cabinet Ibn Sina", 18.05, -15.95)).await.unwrap();
    let other = cabinets.create(new_cabinet("Cabinet Avicenne", 18.06, -15.95)).await.unwrap();
    doctors.create(new_doctor("Dr. Ahmed", cabinet.id)).await.unwrap();
    doctors.create(new_doctor("Dr. Fatimetou", cabinet.id)).await.unwrap();
    doctors.create(new_doctor("Dr. Sidi", other.id)).await.unwrap();

    cabinets.delete(cabinet.id).await.unwrap();

    assert_eq!(store.doctor_count(), 1);
    assert!(doctors.list_by_cabinet(cabinet.id).await.unwrap().is_empty());
    assert!(matches!(cabinets.get(cabinet.id).await, Err(PortError::NotFound(_))));
}

//=========================================================================================
// Doctors
//=========================================================================================

#[tokio::test]
async fn test_doctor_requires_existing_cabinet() {
    let store = InMemoryStore::new();
    let (_, _, doctors) = services(&store);

    let err = doctors.create(new_doctor("Dr. Ahmed", 77)).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
    assert_eq!(store.doctor_count(), 0);
}

#[tokio::test]
async fn test_doctor_name_is_unique_per_cabinet() {
    let store = InMemoryStore::new();
    let (_, cabinets, doctors) = services(&store);
    let first = cabinets.create(new_cabinet("Cabinet A", 18.05, -15.95)).await.unwrap();
    let second = cabinets.create(new_cabinet("Cabinet B", 18.06, -15.95)).await.unwrap();

    doctors.create(new_doctor("Dr. Ahmed", first.id)).await.unwrap();
    let err = doctors.create(new_doctor("Dr. Ahmed", first.id)).await.unwrap_err();
    assert!(matches!(err, PortError::Conflict(_)));

    // Same name in another cabinet is fine.
    let elsewhere = doctors.create(new_doctor("Dr. Ahmed", second.id)).await.unwrap();
    assert_eq!(elsewhere.cabinet.name, "Cabinet B");
}

#[tokio::test]
async fn test_moving_a_doctor_revalidates_the_cabinet() {
    let store = InMemoryStore::new();
    let (_, cabinets, doctors) = services(&store);
    let first = cabinets.create(new_cabinet("Cabinet A", 18.05, -15.95)).await.unwrap();
    let second = cabinets.create(new_cabinet("Cabinet B", 18.06, -15.95)).await.unwrap();
    let doctor = doctors.create(new_doctor("Dr. Ahmed", first.id)).await.unwrap();

    let err = doctors
        .update(
            doctor.id,
            DoctorPatch {
                cabinet_id: Some(999),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
    assert_eq!(doctors.get(doctor.id).await.unwrap().cabinet.id, first.id);

    let moved = doctors
        .update(
            doctor.id,
            DoctorPatch {
                cabinet_id: Some(second.id),
                speciality: Some(Speciality::Cardiology),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.cabinet.id, second.id);
    assert_eq!(moved.cabinet.name, "Cabinet B");
    assert_eq!(moved.speciality, Speciality::Cardiology);
    // Schedule was not part of the patch.
    assert_eq!(moved.schedule.get("MONDAY").map(String::as_str), Some("08:00-12:00"));
}

#[tokio::test]
async fn test_doctor_listing_filters_by_speciality() {
    let store = InMemoryStore::new();
    let (_, cabinets, doctors) = services(&store);
    let cabinet = cabinets.create(new_cabinet("Cabinet A", 18.05, -15.95)).await.unwrap();
    doctors.create(new_doctor("Dr. Ahmed", cabinet.id)).await.unwrap();
    let cardio = doctors.create(new_doctor("Dr. Vall", cabinet.id)).await.unwrap();
    doctors
        .update(
            cardio.id,
            DoctorPatch {
                speciality: Some(Speciality::Cardiology),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let filter = DoctorFilter::parse(None, Some("cardiology")).unwrap();
    let page = doctors.list(&filter, &PageRequest::default()).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].name, "Dr. Vall");
}
