//! Unit tests for fleet-route.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fleet_core::config::RouteConfig;
use fleet_core::GeoPoint;

use crate::cache::RouteCache;
use crate::client::{FailingSource, RouteSource, SyntheticSource};
use crate::error::RouteResult;
use crate::polyline::Polyline;

const DELHI: GeoPoint = GeoPoint { lat: 28.6139, lng: 77.2090 };
const JAIPUR: GeoPoint = GeoPoint { lat: 26.9124, lng: 75.7873 };
const MUMBAI: GeoPoint = GeoPoint { lat: 19.0760, lng: 72.8777 };

fn test_config(cache_size: usize, ttl_secs: f64) -> RouteConfig {
    RouteConfig {
        cache_size,
        cache_ttl_secs: ttl_secs,
        ..RouteConfig::default()
    }
}

// ── Polyline ──────────────────────────────────────────────────────────────────

mod polyline {
    use super::*;

    #[test]
    fn synthetic_has_minimum_density() {
        // Short hop: min point count dominates.
        let near = GeoPoint::new(28.60, 77.20);
        let p = Polyline::synthetic(DELHI, near);
        assert!(p.points.len() >= 20, "got {}", p.points.len());
        assert!(p.fallback);

        // Long haul: ≈5 km spacing dominates (~1150 km ⇒ ~230 points).
        let p = Polyline::synthetic(DELHI, MUMBAI);
        assert!(p.points.len() >= 200, "got {}", p.points.len());
        assert_eq!(p.start().unwrap(), DELHI);
        assert_eq!(p.end().unwrap(), MUMBAI);
    }

    #[test]
    fn progress_sampling_hits_endpoints_and_midpoint() {
        let p = Polyline::synthetic(GeoPoint::new(0.0, 0.0), GeoPoint::new(10.0, 0.0));
        assert_eq!(p.point_at_pct(0.0).unwrap(), GeoPoint::new(0.0, 0.0));
        assert_eq!(p.point_at_pct(100.0).unwrap(), GeoPoint::new(10.0, 0.0));
        let mid = p.point_at_pct(50.0).unwrap();
        assert!((mid.lat - 5.0).abs() < 1e-6, "got {mid}");
    }

    #[test]
    fn progress_sampling_clamps_out_of_range() {
        let p = Polyline::synthetic(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0));
        assert_eq!(p.point_at_pct(-10.0), p.point_at_pct(0.0));
        assert_eq!(p.point_at_pct(250.0), p.point_at_pct(100.0));
    }

    #[test]
    fn empty_and_single_point_paths() {
        let empty = Polyline::from_points(vec![], 0.0, false);
        assert_eq!(empty.point_at_pct(50.0), None);
        assert_eq!(empty.total_km, 0.0);

        let single = Polyline::from_points(vec![DELHI], 0.0, false);
        assert_eq!(single.point_at_pct(75.0), Some(DELHI));
    }

    #[test]
    fn concatenation_drops_duplicated_join_point() {
        let a = Polyline::synthetic(DELHI, JAIPUR);
        let b = Polyline::synthetic(JAIPUR, MUMBAI);
        let a_len = a.points.len();
        let b_len = b.points.len();
        let a_km = a.total_km;
        let b_km = b.total_km;

        let joined = a.then(b);
        assert_eq!(joined.points.len(), a_len + b_len - 1);
        assert!((joined.total_km - (a_km + b_km)).abs() < 1e-9);
        assert_eq!(joined.start().unwrap(), DELHI);
        assert_eq!(joined.end().unwrap(), MUMBAI);
    }

    #[test]
    fn from_points_measures_haversine_length() {
        let p = Polyline::from_points(vec![DELHI, JAIPUR], 0.0, false);
        let direct = DELHI.distance_km(JAIPUR);
        assert!((p.total_km - direct).abs() < 1e-9);
    }
}

// ── Cache ─────────────────────────────────────────────────────────────────────

mod cache {
    use super::*;

    #[test]
    fn hit_after_miss_and_key_rounding() {
        let cache = RouteCache::new(SyntheticSource, &test_config(16, 3600.0));

        let first = cache.route(DELHI, MUMBAI);
        assert!(!first.fallback);
        // A jittered start within ~100 m rounds to the same key.
        let jittered = GeoPoint::new(DELHI.lat + 0.0002, DELHI.lng - 0.0002);
        let second = cache.route(jittered, MUMBAI);
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn source_failure_yields_flagged_fallback() {
        let cache = RouteCache::new(FailingSource, &test_config(16, 3600.0));
        let p = cache.route(DELHI, MUMBAI);
        assert!(p.fallback);
        assert!(p.points.len() >= 20);
        assert_eq!(cache.stats().fallbacks, 1);
        // The fallback is cached; the dead service is not re-queried.
        let again = cache.route(DELHI, MUMBAI);
        assert!(Arc::ptr_eq(&p, &again));
        assert_eq!(cache.stats().fallbacks, 1);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = RouteCache::new(SyntheticSource, &test_config(16, 0.0));
        cache.route(DELHI, MUMBAI);
        std::thread::sleep(Duration::from_millis(5));
        cache.route(DELHI, MUMBAI);
        let stats = cache.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn lru_eviction_keeps_recently_used() {
        let cache = RouteCache::new(SyntheticSource, &test_config(2, 3600.0));
        cache.route(DELHI, MUMBAI); // A
        cache.route(DELHI, JAIPUR); // B
        cache.route(DELHI, MUMBAI); // touch A so B is the LRU victim
        cache.route(JAIPUR, MUMBAI); // C — evicts B
        assert_eq!(cache.stats().evictions, 1);

        cache.route(DELHI, MUMBAI); // A still resident
        assert_eq!(cache.stats().hits, 2);
    }

    /// Source that counts fetches and answers slowly, to observe collapsing.
    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl RouteSource for CountingSource {
        fn fetch(&self, start: GeoPoint, end: GeoPoint) -> RouteResult<Polyline> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            Ok(Polyline::synthetic(start, end))
        }
    }

    #[test]
    fn concurrent_misses_collapse_to_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(RouteCache::new(
            CountingSource { calls: Arc::clone(&calls) },
            &test_config(16, 3600.0),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.route(DELHI, MUMBAI))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in results.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1, "followers must not refetch");
        let stats = cache.stats();
        assert_eq!(stats.misses + stats.hits, 8);
        assert_eq!(stats.misses, 1, "only the leader should miss");
    }
}
